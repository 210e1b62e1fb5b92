use std::collections::HashMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::store::{VehicleKind, VehicleStatus};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// An individual vehicle docked at a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleView {
    pub id: i64,
    #[serde(flatten)]
    pub kind: Option<VehicleKind>,
    pub status: VehicleStatus,
    pub station_id: i64,
    pub price_per_minute: f64,
    pub carbon_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationView {
    pub id: i64,
    pub name: String,
    pub location: Location,
    pub capacity: u32,
    /// Docked vehicles with status `Available`, capped at `capacity`
    pub available_vehicles: u32,
    pub vehicles: Vec<VehicleView>,
}

/// Every station, sorted by name, with the vehicles currently docked there.
///
/// Vehicles out on a rental have no station and are not listed anywhere.
pub fn stations_with_vehicles(conn: &Connection) -> rusqlite::Result<Vec<StationView>> {
    let mut docked: HashMap<i64, Vec<VehicleView>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT v.id, v.status, v.station_id, v.price_per_minute, v.carbon_factor,
                b.vehicle_id, b.tire_status, s.vehicle_id, s.battery_level
         FROM individual_vehicles v
         LEFT JOIN bikes b ON b.vehicle_id = v.id
         LEFT JOIN scooters s ON s.vehicle_id = v.id
         WHERE v.station_id IS NOT NULL
         ORDER BY v.id",
    )?;
    let vehicle_iter = stmt.query_map([], |row| {
        Ok(VehicleView {
            id: row.get(0)?,
            status: row.get(1)?,
            station_id: row.get(2)?,
            price_per_minute: row.get(3)?,
            carbon_factor: row.get(4)?,
            kind: VehicleKind::from_columns(row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?),
        })
    })?;
    for vehicle in vehicle_iter {
        let vehicle = vehicle?;
        docked.entry(vehicle.station_id).or_default().push(vehicle);
    }

    let mut stmt =
        conn.prepare("SELECT id, name, capacity, latitude, longitude FROM stations ORDER BY name ASC")?;
    let station_iter = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u32>(2)?,
            Location {
                lat: row.get(3)?,
                lng: row.get(4)?,
            },
        ))
    })?;

    let mut stations = Vec::new();
    for station in station_iter {
        let (id, name, capacity, location) = station?;
        let vehicles = docked.remove(&id).unwrap_or_default();
        let available = vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::Available)
            .count() as u32;
        stations.push(StationView {
            id,
            name,
            location,
            capacity,
            available_vehicles: available,
            vehicles,
        });
    }
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{seed, Store, TripStatus};
    use crate::trips::{end_rental, start_rental, EndRental, StartRental};
    use chrono::Utc;

    #[test]
    fn stations_are_sorted_and_counted() {
        let store = Store::open_in_memory().unwrap();
        seed::seed_demo(&mut store.lock()).unwrap();
        let conn = store.lock();
        conn.execute(
            "UPDATE individual_vehicles SET status = 'OutOfService' WHERE id = 2",
            [],
        )
        .unwrap();

        let stations = stations_with_vehicles(&conn).unwrap();
        let names: Vec<_> = stations.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Central Plaza", "Riverside Park", "University Campus"]);

        let central = &stations[0];
        assert_eq!(central.vehicles.len(), 2);
        assert_eq!(central.available_vehicles, 1);
        assert_eq!(central.location, Location { lat: 4.6097, lng: -74.0817 });
    }

    #[test]
    fn rented_vehicles_are_not_docked_anywhere() {
        let store = Store::open_in_memory().unwrap();
        seed::seed_demo(&mut store.lock()).unwrap();
        let mut conn = store.lock();
        let rental = StartRental {
            user_id: 1,
            vehicle_id: 1,
            start_station: "Central Plaza".to_string(),
            planned_destination: "Riverside Park".to_string(),
        };
        start_rental(&mut conn, &rental, Utc::now()).unwrap();

        let stations = stations_with_vehicles(&conn).unwrap();
        assert!(stations.iter().all(|s| s.vehicles.iter().all(|v| v.id != 1)));
        let central = &stations[0];
        assert_eq!(central.vehicles.len(), 1);
        assert_eq!(central.available_vehicles, 1);
    }

    #[test]
    fn available_count_matches_docked_vehicles() {
        let store = Store::open_in_memory().unwrap();
        seed::seed_demo(&mut store.lock()).unwrap();
        let mut conn = store.lock();
        let rental = StartRental {
            user_id: 1,
            vehicle_id: 3,
            start_station: "Riverside Park".to_string(),
            planned_destination: "Central Plaza".to_string(),
        };
        let trip = start_rental(&mut conn, &rental, Utc::now()).unwrap();
        conn.execute("UPDATE stations SET capacity = 2 WHERE id = 1", [])
            .unwrap();
        let back = EndRental {
            end_station: "Central Plaza".to_string(),
            actual_destination: "Central Plaza".to_string(),
            rating: 5,
            status: TripStatus::Completed,
        };
        end_rental(&mut conn, trip.id, &back, Utc::now()).unwrap();

        for station in stations_with_vehicles(&conn).unwrap() {
            let docked_available = station
                .vehicles
                .iter()
                .filter(|v| v.status == VehicleStatus::Available)
                .count() as u32;
            assert_eq!(station.available_vehicles, docked_available);
            assert!(station.vehicles.len() as u32 <= station.capacity);
        }
    }

    #[test]
    fn vehicle_subtype_is_flattened_into_the_payload() {
        let store = Store::open_in_memory().unwrap();
        seed::seed_demo(&mut store.lock()).unwrap();
        let stations = stations_with_vehicles(&store.lock()).unwrap();

        let value = serde_json::to_value(&stations[1].vehicles[0]).unwrap();
        assert_eq!(value["type"], "scooter");
        assert_eq!(value["batteryLevel"], 85.0);
        assert_eq!(value["pricePerMinute"], 0.25);
        assert_eq!(value["status"], "Available");
    }
}
