//! JSON bodies exchanged between the HTTP service and its clients.
//!
//! Request bodies keep every field optional so that a missing field is reported as an
//! input error by `validate` rather than as a deserialization failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{RouteView, StationView};
use crate::store::TripStatus;
use crate::trips::{
    CurrentTrip, EndRental, EndRide, PublicTransportTrip, StartRental, StartRide, TripError,
    VehicleTrip,
};
use crate::users::{Registration, User, UserError};

fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn check_rating(rating: u8) -> Result<u8, TripError> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(TripError::InvalidInput(format!(
            "Rating must be between 1 and 5, got {}",
            rating
        )))
    }
}

fn check_final_status(status: TripStatus) -> Result<TripStatus, TripError> {
    match status {
        TripStatus::InProgress => Err(TripError::InvalidInput(
            "A trip cannot be ended with status in-progress".to_string(),
        )),
        status => Ok(status),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRentalBody {
    pub user_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub start_station: Option<String>,
    pub planned_destination: Option<String>,
}

impl StartRentalBody {
    pub fn validate(self) -> Result<StartRental, TripError> {
        match (
            self.user_id,
            self.vehicle_id,
            present(self.start_station),
            present(self.planned_destination),
        ) {
            (Some(user_id), Some(vehicle_id), Some(start_station), Some(planned_destination)) => {
                Ok(StartRental {
                    user_id,
                    vehicle_id,
                    start_station,
                    planned_destination,
                })
            }
            _ => Err(TripError::missing("start the vehicle trip")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRentalBody {
    pub end_station: Option<String>,
    pub actual_destination: Option<String>,
    pub rating: Option<u8>,
    pub status: Option<TripStatus>,
}

impl EndRentalBody {
    pub fn validate(self) -> Result<EndRental, TripError> {
        match (
            present(self.end_station),
            present(self.actual_destination),
            self.rating,
            self.status,
        ) {
            (Some(end_station), Some(actual_destination), Some(rating), Some(status)) => {
                Ok(EndRental {
                    end_station,
                    actual_destination,
                    rating: check_rating(rating)?,
                    status: check_final_status(status)?,
                })
            }
            _ => Err(TripError::missing("end the vehicle trip")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRideBody {
    pub user_id: Option<i64>,
    pub route_id: Option<i64>,
    pub start_station: Option<String>,
    pub planned_destination: Option<String>,
    pub full_route: Option<Vec<String>>,
    pub current_station_index: Option<usize>,
}

impl StartRideBody {
    pub fn validate(self) -> Result<StartRide, TripError> {
        match (
            self.user_id,
            self.route_id,
            present(self.start_station),
            present(self.planned_destination),
            self.full_route.filter(|stops| !stops.is_empty()),
            self.current_station_index,
        ) {
            (
                Some(user_id),
                Some(route_id),
                Some(start_station),
                Some(planned_destination),
                Some(full_route),
                Some(current_station_index),
            ) => Ok(StartRide {
                user_id,
                route_id,
                start_station,
                planned_destination,
                full_route,
                current_station_index,
            }),
            _ => Err(TripError::missing("start the public transport trip")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRideBody {
    pub actual_destination: Option<String>,
    pub status: Option<TripStatus>,
    pub rating: Option<u8>,
}

impl EndRideBody {
    pub fn validate(self) -> Result<EndRide, TripError> {
        match (present(self.actual_destination), self.status, self.rating) {
            (Some(actual_destination), Some(status), Some(rating)) => Ok(EndRide {
                actual_destination,
                status: check_final_status(status)?,
                rating: check_rating(rating)?,
            }),
            _ => Err(TripError::missing("end the public transport trip")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRideBody {
    pub current_station_index: Option<i64>,
}

impl AdvanceRideBody {
    pub fn validate(self) -> Result<i64, TripError> {
        self.current_station_index
            .ok_or_else(|| TripError::InvalidInput("Invalid station index".to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl RegisterBody {
    pub fn validate(self) -> Result<Registration, UserError> {
        match (
            present(self.first_name),
            present(self.last_name),
            present(self.email),
            present(self.password),
        ) {
            (Some(first_name), Some(last_name), Some(email), Some(password)) => Ok(Registration {
                first_name,
                last_name,
                email,
                password,
            }),
            _ => Err(UserError::InvalidInput("All fields are required".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginBody {
    pub fn validate(self) -> Result<(String, String), UserError> {
        match (present(self.email), self.password.filter(|p| !p.is_empty())) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(UserError::InvalidInput(
                "Email and password are required".to_string(),
            )),
        }
    }
}

/// `{message, trip}` returned by every trip mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripEnvelope<T> {
    pub message: String,
    pub trip: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripList<T> {
    pub trips: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsPayload {
    pub stations: Vec<StationView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesPayload {
    pub routes: Vec<RouteView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripKind {
    Vehicle,
    PublicTransport,
}

/// `{currentTrip, type}`, or `{currentTrip: null}` when the user has no active trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentTripPayload {
    #[serde(rename = "currentTrip")]
    pub current_trip: Option<Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TripKind>,
}

impl CurrentTripPayload {
    pub fn from_current(trip: Option<CurrentTrip>) -> Result<Self, serde_json::Error> {
        let (current_trip, kind) = match trip {
            Some(CurrentTrip::Vehicle(trip)) => {
                (Some(serde_json::to_value(trip)?), Some(TripKind::Vehicle))
            }
            Some(CurrentTrip::PublicTransport(trip)) => (
                Some(serde_json::to_value(trip)?),
                Some(TripKind::PublicTransport),
            ),
            None => (None, None),
        };
        Ok(CurrentTripPayload { current_trip, kind })
    }

    pub fn into_current(self) -> Result<Option<CurrentTrip>, serde_json::Error> {
        use serde::de::Error;

        let trip = match self.current_trip {
            None | Some(Value::Null) => return Ok(None),
            Some(trip) => trip,
        };
        match self.kind {
            Some(TripKind::Vehicle) => Ok(Some(CurrentTrip::Vehicle(serde_json::from_value::<
                VehicleTrip,
            >(trip)?))),
            Some(TripKind::PublicTransport) => Ok(Some(CurrentTrip::PublicTransport(
                serde_json::from_value::<PublicTransportTrip>(trip)?,
            ))),
            None => Err(serde_json::Error::custom("current trip without a type")),
        }
    }
}
