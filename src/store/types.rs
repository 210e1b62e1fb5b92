use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Implements the text mapping used by the database columns for a plain enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

/// Availability of an individual or collective vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    Available,
    OutOfService,
}

text_enum!(VehicleStatus {
    Available => "Available",
    OutOfService => "OutOfService",
});

/// Lifecycle state shared by rentals and public transport rides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripStatus {
    InProgress,
    Completed,
    Cancelled,
}

text_enum!(TripStatus {
    InProgress => "in-progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Bus,
    Tram,
}

text_enum!(TransportType {
    Bus => "bus",
    Tram => "tram",
});

/// Employees get access to the admin screens, travelers do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Traveler,
    Employee,
}

text_enum!(UserType {
    Traveler => "traveler",
    Employee => "employee",
});

/// Subtype of an individual vehicle together with its type-specific attribute.
///
/// The database keeps bikes and scooters in separate tables keyed by the vehicle id;
/// the subtype is resolved once when a row is read so nothing past the data-access
/// layer has to look at nullable join columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VehicleKind {
    Bike {
        #[serde(rename = "tireStatus")]
        tire_status: Option<String>,
    },
    Scooter {
        #[serde(rename = "batteryLevel")]
        battery_level: Option<f64>,
    },
}

impl VehicleKind {
    /// Resolve the subtype from the LEFT JOIN columns of the bike and scooter tables.
    /// A vehicle present in both tables counts as a bike.
    pub fn from_columns(
        bike_id: Option<i64>,
        tire_status: Option<String>,
        scooter_id: Option<i64>,
        battery_level: Option<f64>,
    ) -> Option<VehicleKind> {
        if bike_id.is_some() {
            Some(VehicleKind::Bike { tire_status })
        } else if scooter_id.is_some() {
            Some(VehicleKind::Scooter { battery_level })
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VehicleKind::Bike { .. } => "bike",
            VehicleKind::Scooter { .. } => "scooter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_round_trip_through_text() {
        assert_eq!("in-progress".parse::<TripStatus>(), Ok(TripStatus::InProgress));
        assert_eq!(VehicleStatus::OutOfService.as_str(), "OutOfService");
        assert!("tranvia".parse::<TransportType>().is_err());
    }

    #[test]
    fn trip_status_serializes_kebab_case() {
        let json = serde_json::to_string(&TripStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn vehicle_kind_prefers_bike_when_both_joins_match() {
        let kind = VehicleKind::from_columns(Some(1), Some("good".into()), Some(1), Some(50.0));
        assert_eq!(
            kind,
            Some(VehicleKind::Bike {
                tire_status: Some("good".into())
            })
        );
        assert_eq!(VehicleKind::from_columns(None, None, None, None), None);
    }

    #[test]
    fn vehicle_kind_is_tagged_by_type() {
        let scooter = VehicleKind::Scooter {
            battery_level: Some(80.0),
        };
        let value = serde_json::to_value(&scooter).unwrap();
        assert_eq!(value["type"], "scooter");
        assert_eq!(value["batteryLevel"], 80.0);
    }
}
