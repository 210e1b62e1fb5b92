use rusqlite::{params, Connection};

use super::{TransportType, UserType, VehicleStatus};

struct SeedVehicle {
    id: i64,
    station_id: i64,
    price_per_minute: f64,
    carbon_factor: f64,
    bike_tires: Option<&'static str>,
    scooter_battery: Option<f64>,
}

const STATIONS: [(i64, &str, i64, f64, f64); 3] = [
    (1, "Central Plaza", 10, 4.6097, -74.0817),
    (2, "Riverside Park", 8, 4.6250, -74.0700),
    (3, "University Campus", 12, 4.6380, -74.0830),
];

const VEHICLES: [SeedVehicle; 5] = [
    SeedVehicle {
        id: 1,
        station_id: 1,
        price_per_minute: 0.15,
        carbon_factor: 0.12,
        bike_tires: Some("good"),
        scooter_battery: None,
    },
    SeedVehicle {
        id: 2,
        station_id: 1,
        price_per_minute: 0.15,
        carbon_factor: 0.12,
        bike_tires: Some("worn"),
        scooter_battery: None,
    },
    SeedVehicle {
        id: 3,
        station_id: 2,
        price_per_minute: 0.25,
        carbon_factor: 0.08,
        bike_tires: None,
        scooter_battery: Some(85.0),
    },
    SeedVehicle {
        id: 4,
        station_id: 3,
        price_per_minute: 0.25,
        carbon_factor: 0.08,
        bike_tires: None,
        scooter_battery: Some(40.0),
    },
    SeedVehicle {
        id: 5,
        station_id: 3,
        price_per_minute: 0.15,
        carbon_factor: 0.12,
        bike_tires: Some("good"),
        scooter_battery: None,
    },
];

const STOPS: [(i64, &str); 7] = [
    (1, "Central Plaza"),
    (2, "Market Street"),
    (3, "City Hall"),
    (4, "Riverside Park"),
    (5, "Museum District"),
    (6, "University Campus"),
    (7, "North Terminal"),
];

/// (id, name, type, color, estimated arrival, principal destinations, stop ids in order)
type SeedRoute = (
    i64,
    &'static str,
    TransportType,
    &'static str,
    Option<&'static str>,
    &'static [&'static str],
    &'static [i64],
);

const ROUTES: [SeedRoute; 2] = [
    (
        1,
        "Line 1",
        TransportType::Bus,
        "#2563eb",
        Some("5 min"),
        &["Central Plaza", "University Campus"],
        &[1, 2, 3, 4, 5, 6],
    ),
    (
        2,
        "Tram A",
        TransportType::Tram,
        "#16a34a",
        None,
        &["North Terminal", "City Hall"],
        &[7, 6, 3],
    ),
];

/// (id, route, status, fare per ride, carbon factor). Tram A's only car is in the depot.
const COLLECTIVE_VEHICLES: [(i64, i64, VehicleStatus, f64, f64); 3] = [
    (1, 1, VehicleStatus::Available, 1.5, 0.2),
    (2, 1, VehicleStatus::Available, 1.5, 0.2),
    (3, 2, VehicleStatus::OutOfService, 2.0, 0.3),
];

const USERS: [(i64, &str, &str, &str, &str, UserType); 2] = [
    (1, "Ana", "Rivera", "ana@example.com", "demo123", UserType::Traveler),
    (2, "Luis", "Ortega", "ops@example.com", "admin123", UserType::Employee),
];

/// Insert the demo data set: three stations, five individual vehicles, a bus line and a
/// tram line with their stops, the collective fleet and two users.
///
/// Runs in one transaction with fixed ids, so seeding an already seeded database fails
/// on the primary keys and leaves it untouched.
pub fn seed_demo(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    for (id, first, last, email, password, user_type) in USERS {
        tx.execute(
            "INSERT INTO users (id, first_name, last_name, email, password, user_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, first, last, email, password, user_type],
        )?;
    }

    for (id, name, capacity, lat, lng) in STATIONS {
        tx.execute(
            "INSERT INTO stations (id, name, capacity, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, name, capacity, lat, lng],
        )?;
    }

    for vehicle in &VEHICLES {
        tx.execute(
            "INSERT INTO individual_vehicles (id, station_id, status, price_per_minute, carbon_factor)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vehicle.id,
                vehicle.station_id,
                VehicleStatus::Available,
                vehicle.price_per_minute,
                vehicle.carbon_factor
            ],
        )?;
        if let Some(tires) = vehicle.bike_tires {
            tx.execute(
                "INSERT INTO bikes (vehicle_id, tire_status) VALUES (?1, ?2)",
                params![vehicle.id, tires],
            )?;
        }
        if let Some(battery) = vehicle.scooter_battery {
            tx.execute(
                "INSERT INTO scooters (vehicle_id, battery_level) VALUES (?1, ?2)",
                params![vehicle.id, battery],
            )?;
        }
    }

    for (id, name) in STOPS {
        tx.execute(
            "INSERT INTO stops (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
    }

    for (id, name, transport_type, color, eta, destinations, stops) in ROUTES {
        let destinations = serde_json::to_string(destinations)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        tx.execute(
            "INSERT INTO routes (id, name, transport_type, color, estimated_arrival, destinations)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, name, transport_type, color, eta, destinations],
        )?;
        for (position, stop_id) in stops.iter().enumerate() {
            tx.execute(
                "INSERT INTO route_stops (route_id, stop_id, position) VALUES (?1, ?2, ?3)",
                params![id, stop_id, position as i64 + 1],
            )?;
        }
    }

    for (id, route_id, status, fare, carbon_factor) in COLLECTIVE_VEHICLES {
        tx.execute(
            "INSERT INTO collective_vehicles (id, route_id, status, price_per_ride, carbon_factor)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, route_id, status, fare, carbon_factor],
        )?;
    }

    tx.commit()?;
    log::info!(
        "Seeded {} stations, {} vehicles, {} routes",
        STATIONS.len(),
        VEHICLES.len(),
        ROUTES.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn seeding_twice_fails_without_partial_writes() {
        let store = Store::open_in_memory().unwrap();
        seed_demo(&mut store.lock()).unwrap();
        assert!(seed_demo(&mut store.lock()).is_err());

        let vehicles: i64 = store
            .lock()
            .query_row("SELECT COUNT(*) FROM individual_vehicles", [], |row| row.get(0))
            .unwrap();
        assert_eq!(vehicles, 5);
    }
}
