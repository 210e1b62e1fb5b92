use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::store::{json_list, TransportType, TripStatus, VehicleStatus};

use super::billing;
use super::current;
use super::error::TripError;

/// A ride on a bus or tram of a fixed route.
///
/// `full_route` is the stop sequence captured when the ride started, and
/// `current_station_index` points into it. The pointer only ever moves forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTransportTrip {
    pub id: i64,
    pub user_id: i64,
    pub collective_vehicle_id: i64,
    pub route_id: i64,
    pub route_name: String,
    pub transport_type: TransportType,
    pub start_station: String,
    pub planned_destination: String,
    pub actual_destination: Option<String>,
    pub current_station_index: usize,
    pub full_route: Vec<String>,
    pub status: TripStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub cost: Option<f64>,
    pub carbon_saved: Option<f64>,
    pub rating: Option<u8>,
}

impl PublicTransportTrip {
    /// Index of the planned destination within the route snapshot.
    pub fn destination_index(&self) -> Option<usize> {
        self.full_route
            .iter()
            .position(|stop| *stop == self.planned_destination)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartRide {
    pub user_id: i64,
    pub route_id: i64,
    pub start_station: String,
    pub planned_destination: String,
    pub full_route: Vec<String>,
    pub current_station_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndRide {
    pub actual_destination: String,
    pub status: TripStatus,
    pub rating: u8,
}

const SELECT_RIDE: &str = "
    SELECT t.id, t.user_id, t.collective_vehicle_id, t.route_id, r.name, r.transport_type,
           t.origin, t.planned_destination, t.actual_destination, t.current_station_index,
           t.full_route, t.status, t.start_time, t.end_time, t.cost, t.carbon_saved, t.rating
    FROM public_transport_trips t
    JOIN routes r ON r.id = t.route_id";

fn ride_from_row(row: &Row<'_>) -> rusqlite::Result<PublicTransportTrip> {
    let index: i64 = row.get(9)?;
    Ok(PublicTransportTrip {
        id: row.get(0)?,
        user_id: row.get(1)?,
        collective_vehicle_id: row.get(2)?,
        route_id: row.get(3)?,
        route_name: row.get(4)?,
        transport_type: row.get(5)?,
        start_station: row.get(6)?,
        planned_destination: row.get(7)?,
        actual_destination: row.get(8)?,
        current_station_index: index.max(0) as usize,
        full_route: json_list(row, 10)?,
        status: row.get(11)?,
        start_time: row.get(12)?,
        end_time: row.get(13)?,
        cost: row.get(14)?,
        carbon_saved: row.get(15)?,
        rating: row.get(16)?,
    })
}

fn find_ride(conn: &Connection, trip_id: i64) -> Result<Option<PublicTransportTrip>, TripError> {
    let trip = conn
        .query_row(
            &format!("{} WHERE t.id = ?1", SELECT_RIDE),
            [trip_id],
            ride_from_row,
        )
        .optional()?;
    Ok(trip)
}

fn stop_id(conn: &Connection, name: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row("SELECT id FROM stops WHERE name = ?1", [name], |row| row.get(0))
        .optional()
}

fn stop_position(conn: &Connection, route_id: i64, stop_id: i64) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT position FROM route_stops WHERE route_id = ?1 AND stop_id = ?2",
        [route_id, stop_id],
        |row| row.get(0),
    )
    .optional()
}

/// Board a bus or tram.
///
/// # Parameters
/// - `cmd`: the ride request, including the stop sequence snapshot and starting index
/// - `now`: start time recorded on the trip
/// - `rng`: picks among the route's available collective vehicles
///
/// # Returns
/// The created trip, with route name and transport type resolved. Fails with
/// [`TripError::NoVehicleAvailable`] (and writes nothing) when no vehicle of the route is
/// `Available`.
pub fn start_ride<R: Rng + ?Sized>(
    conn: &mut Connection,
    cmd: &StartRide,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<PublicTransportTrip, TripError> {
    if cmd.current_station_index >= cmd.full_route.len() {
        return Err(TripError::InvalidInput(format!(
            "Starting station index {} is outside the route ({} stops)",
            cmd.current_station_index,
            cmd.full_route.len()
        )));
    }
    if !cmd.full_route.contains(&cmd.planned_destination) {
        return Err(TripError::InvalidInput(format!(
            "Destination '{}' is not on the route",
            cmd.planned_destination
        )));
    }

    let tx = conn.transaction()?;
    current::ensure_can_start(&tx, cmd.user_id)?;

    let (route_name, transport_type): (String, TransportType) = tx
        .query_row(
            "SELECT name, transport_type FROM routes WHERE id = ?1",
            [cmd.route_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| TripError::NotFound("Public transport route not found".to_string()))?;

    let available: Vec<i64> = {
        let mut stmt = tx.prepare(
            "SELECT id FROM collective_vehicles WHERE route_id = ?1 AND status = ?2 ORDER BY id",
        )?;
        let ids = stmt
            .query_map(params![cmd.route_id, VehicleStatus::Available], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        ids
    };
    let vehicle_id = match available.choose(rng) {
        Some(id) => *id,
        None => {
            log::warn!("No collective vehicle available on route {}", cmd.route_id);
            return Err(TripError::NoVehicleAvailable(cmd.route_id));
        }
    };

    let stops = (
        stop_id(&tx, &cmd.start_station)?,
        stop_id(&tx, &cmd.planned_destination)?,
    );
    let (start_stop, end_stop) = match stops {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(TripError::NotFound(
                "Start or destination stop not found".to_string(),
            ))
        }
    };

    tx.execute(
        "INSERT INTO public_transport_trips (user_id, collective_vehicle_id, route_id, start_stop_id,
            end_stop_id, origin, planned_destination, current_station_index, full_route, status, start_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            cmd.user_id,
            vehicle_id,
            cmd.route_id,
            start_stop,
            end_stop,
            cmd.start_station,
            cmd.planned_destination,
            cmd.current_station_index as i64,
            serde_json::to_string(&cmd.full_route)?,
            TripStatus::InProgress,
            now
        ],
    )?;
    let trip_id = tx.last_insert_rowid();

    let trip = find_ride(&tx, trip_id)?
        .ok_or_else(|| TripError::NotFound("Public transport trip not found".to_string()))?;
    tx.commit()?;
    log::info!(
        "User {} boarded {} {} (vehicle {}) at {}, heading to {}",
        cmd.user_id,
        transport_type,
        route_name,
        vehicle_id,
        cmd.start_station,
        cmd.planned_destination
    );
    Ok(trip)
}

/// Get off a bus or tram and bill the ride.
///
/// The fare is the vehicle's flat price per ride; carbon is derived from how many stops
/// separate the boarding stop from the destination stop recorded at boarding time.
pub fn end_ride(
    conn: &mut Connection,
    trip_id: i64,
    cmd: &EndRide,
    now: DateTime<Utc>,
) -> Result<PublicTransportTrip, TripError> {
    let tx = conn.transaction()?;

    let (route_id, start_stop, end_stop, fare_per_ride, carbon_factor): (i64, i64, i64, f64, f64) = tx
        .query_row(
            "SELECT c.route_id, t.start_stop_id, t.end_stop_id, c.price_per_ride, c.carbon_factor
             FROM public_transport_trips t
             JOIN collective_vehicles c ON c.id = t.collective_vehicle_id
             WHERE t.id = ?1",
            [trip_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .optional()?
        .ok_or_else(|| TripError::NotFound("Public transport trip not found".to_string()))?;

    let positions = (
        stop_position(&tx, route_id, start_stop)?,
        stop_position(&tx, route_id, end_stop)?,
    );
    let (start_position, end_position) = match positions {
        (Some(start), Some(end)) => (start, end),
        _ => {
            log::warn!(
                "Cannot order stops {} and {} on route {} for trip {}",
                start_stop,
                end_stop,
                route_id,
                trip_id
            );
            return Err(TripError::Compute(
                "Could not compute the distance of the trip".to_string(),
            ));
        }
    };

    let fare = billing::ride_fare(start_position, end_position, fare_per_ride, carbon_factor);

    let updated = tx.execute(
        "UPDATE public_transport_trips
         SET end_time = ?1, actual_destination = ?2, status = ?3, cost = ?4, carbon_saved = ?5, rating = ?6
         WHERE id = ?7 AND status = ?8",
        params![
            now,
            cmd.actual_destination,
            cmd.status,
            fare.cost,
            fare.carbon_saved,
            cmd.rating,
            trip_id,
            TripStatus::InProgress
        ],
    )?;
    if updated == 0 {
        return Err(TripError::NotFound(
            "Public transport trip not found or already finished".to_string(),
        ));
    }

    let trip = find_ride(&tx, trip_id)?
        .ok_or_else(|| TripError::NotFound("Public transport trip not found".to_string()))?;
    tx.commit()?;
    log::info!(
        "Ride {} ended at {}: {:.2} km, fare {:.2}, {:.2} kg CO2 saved",
        trip_id,
        cmd.actual_destination,
        fare.distance_km,
        fare.cost,
        fare.carbon_saved
    );
    Ok(trip)
}

/// Persist ride progress.
///
/// Only in-progress rides move. A smaller index than the stored one leaves the ride
/// untouched, an index past the last stop of the snapshot is rejected.
pub fn advance_ride_stop(
    conn: &mut Connection,
    trip_id: i64,
    new_index: i64,
) -> Result<PublicTransportTrip, TripError> {
    if new_index < 0 {
        return Err(TripError::InvalidInput("Invalid station index".to_string()));
    }
    let new_index = new_index as usize;

    let tx = conn.transaction()?;
    let trip = find_ride(&tx, trip_id)?
        .filter(|trip| trip.status == TripStatus::InProgress)
        .ok_or_else(|| {
            TripError::NotFound("In-progress trip not found or already finished".to_string())
        })?;

    if new_index >= trip.full_route.len() {
        return Err(TripError::InvalidInput(format!(
            "Station index {} is past the end of the route ({} stops)",
            new_index,
            trip.full_route.len()
        )));
    }
    if new_index < trip.current_station_index {
        log::warn!(
            "Ignoring backwards advance of ride {} from {} to {}",
            trip_id,
            trip.current_station_index,
            new_index
        );
        return Ok(trip);
    }

    tx.execute(
        "UPDATE public_transport_trips SET current_station_index = ?1 WHERE id = ?2 AND status = ?3",
        params![new_index as i64, trip_id, TripStatus::InProgress],
    )?;
    let trip = find_ride(&tx, trip_id)?
        .ok_or_else(|| TripError::NotFound("Public transport trip not found".to_string()))?;
    tx.commit()?;
    log::debug!("Ride {} now at stop {}", trip_id, new_index);
    Ok(trip)
}

/// All rides of a user, most recent first.
pub fn user_rides(conn: &Connection, user_id: i64) -> Result<Vec<PublicTransportTrip>, TripError> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE t.user_id = ?1 ORDER BY t.start_time DESC, t.id DESC",
        SELECT_RIDE
    ))?;
    let trips = stmt
        .query_map([user_id], ride_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(trips)
}

pub(crate) fn in_progress_rides(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<PublicTransportTrip>, TripError> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE t.user_id = ?1 AND t.status = ?2 ORDER BY t.start_time DESC, t.id DESC",
        SELECT_RIDE
    ))?;
    let trips = stmt
        .query_map(params![user_id, TripStatus::InProgress], ride_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(trips)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::{seed, Store};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Stop sequence of the seeded bus line.
    pub(crate) fn line_one() -> Vec<String> {
        [
            "Central Plaza",
            "Market Street",
            "City Hall",
            "Riverside Park",
            "Museum District",
            "University Campus",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn seeded() -> Store {
        let store = Store::open_in_memory().unwrap();
        seed::seed_demo(&mut store.lock()).unwrap();
        store
    }

    fn board(start: &str, index: usize, destination: &str) -> StartRide {
        StartRide {
            user_id: 1,
            route_id: 1,
            start_station: start.to_string(),
            planned_destination: destination.to_string(),
            full_route: line_one(),
            current_station_index: index,
        }
    }

    fn alight(destination: &str) -> EndRide {
        EndRide {
            actual_destination: destination.to_string(),
            status: TripStatus::Completed,
            rating: 5,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn bus_ride_from_index_two_to_five() {
        let store = seeded();
        let mut conn = store.lock();
        let trip = start_ride(
            &mut conn,
            &board("City Hall", 2, "University Campus"),
            Utc::now(),
            &mut rng(),
        )
        .unwrap();
        assert_eq!(trip.route_name, "Line 1");
        assert_eq!(trip.transport_type, TransportType::Bus);
        assert_eq!(trip.current_station_index, 2);
        assert_eq!(trip.destination_index(), Some(5));
        assert!([1, 2].contains(&trip.collective_vehicle_id));

        let done = end_ride(&mut conn, trip.id, &alight("University Campus"), Utc::now()).unwrap();
        assert_eq!(done.status, TripStatus::Completed);
        assert_eq!(done.cost, Some(1.5));
        assert_eq!(done.carbon_saved, Some(0.3));
        assert_eq!(done.rating, Some(5));
        assert_eq!(done.actual_destination.as_deref(), Some("University Campus"));
    }

    #[test]
    fn no_available_vehicle_creates_nothing() {
        let store = seeded();
        let mut conn = store.lock();
        let cmd = StartRide {
            user_id: 1,
            route_id: 2,
            start_station: "North Terminal".to_string(),
            planned_destination: "City Hall".to_string(),
            full_route: vec![
                "North Terminal".to_string(),
                "University Campus".to_string(),
                "City Hall".to_string(),
            ],
            current_station_index: 0,
        };

        let err = start_ride(&mut conn, &cmd, Utc::now(), &mut rng()).unwrap_err();
        assert!(matches!(err, TripError::NoVehicleAvailable(2)));
        assert!(user_rides(&conn, 1).unwrap().is_empty());
    }

    #[test]
    fn unknown_route_or_stop_is_not_found() {
        let store = seeded();
        let mut conn = store.lock();
        let mut cmd = board("City Hall", 2, "University Campus");
        cmd.route_id = 9;
        assert!(matches!(
            start_ride(&mut conn, &cmd, Utc::now(), &mut rng()),
            Err(TripError::NotFound(_))
        ));

        let mut cmd = board("Atlantis", 0, "City Hall");
        cmd.full_route[0] = "Atlantis".to_string();
        assert!(matches!(
            start_ride(&mut conn, &cmd, Utc::now(), &mut rng()),
            Err(TripError::NotFound(_))
        ));
    }

    #[test]
    fn snapshot_must_contain_start_index_and_destination() {
        let store = seeded();
        let mut conn = store.lock();
        assert!(matches!(
            start_ride(&mut conn, &board("City Hall", 6, "University Campus"), Utc::now(), &mut rng()),
            Err(TripError::InvalidInput(_))
        ));
        assert!(matches!(
            start_ride(&mut conn, &board("City Hall", 2, "North Terminal"), Utc::now(), &mut rng()),
            Err(TripError::InvalidInput(_))
        ));
    }

    #[test]
    fn stop_off_the_route_is_a_compute_error() {
        let store = seeded();
        let mut conn = store.lock();
        // North Terminal exists as a stop but is not served by Line 1
        let cmd = StartRide {
            user_id: 1,
            route_id: 1,
            start_station: "North Terminal".to_string(),
            planned_destination: "City Hall".to_string(),
            full_route: vec!["North Terminal".to_string(), "City Hall".to_string()],
            current_station_index: 0,
        };
        let trip = start_ride(&mut conn, &cmd, Utc::now(), &mut rng()).unwrap();

        let err = end_ride(&mut conn, trip.id, &alight("City Hall"), Utc::now()).unwrap_err();
        assert!(matches!(err, TripError::Compute(_)));
        let still = find_ride(&conn, trip.id).unwrap().unwrap();
        assert_eq!(still.status, TripStatus::InProgress);
    }

    #[test]
    fn advance_is_monotonic_and_bounded() {
        let store = seeded();
        let mut conn = store.lock();
        let trip = start_ride(
            &mut conn,
            &board("Market Street", 1, "University Campus"),
            Utc::now(),
            &mut rng(),
        )
        .unwrap();

        assert_eq!(advance_ride_stop(&mut conn, trip.id, 3).unwrap().current_station_index, 3);
        assert_eq!(advance_ride_stop(&mut conn, trip.id, 2).unwrap().current_station_index, 3);
        assert_eq!(advance_ride_stop(&mut conn, trip.id, 3).unwrap().current_station_index, 3);
        assert!(matches!(
            advance_ride_stop(&mut conn, trip.id, 6),
            Err(TripError::InvalidInput(_))
        ));
        assert!(matches!(
            advance_ride_stop(&mut conn, trip.id, -1),
            Err(TripError::InvalidInput(_))
        ));

        end_ride(&mut conn, trip.id, &alight("University Campus"), Utc::now()).unwrap();
        assert!(matches!(
            advance_ride_stop(&mut conn, trip.id, 4),
            Err(TripError::NotFound(_))
        ));
        assert!(matches!(
            advance_ride_stop(&mut conn, 404, 1),
            Err(TripError::NotFound(_))
        ));
    }

    #[test]
    fn cannot_board_while_renting() {
        let store = seeded();
        let mut conn = store.lock();
        crate::trips::rental::start_rental(
            &mut conn,
            &crate::trips::rental::StartRental {
                user_id: 1,
                vehicle_id: 1,
                start_station: "Central Plaza".to_string(),
                planned_destination: "City Hall".to_string(),
            },
            Utc::now(),
        )
        .unwrap();

        let err = start_ride(
            &mut conn,
            &board("City Hall", 2, "University Campus"),
            Utc::now(),
            &mut rng(),
        )
        .unwrap_err();
        assert!(matches!(err, TripError::ActiveTripExists(1)));
    }
}
