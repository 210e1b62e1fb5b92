use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::store::{TripStatus, VehicleKind, VehicleStatus};

use super::billing;
use super::current;
use super::error::TripError;

/// A rental of an individual vehicle (bike or scooter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTrip {
    pub id: i64,
    pub user_id: i64,
    pub vehicle_id: i64,
    /// Subtype of the rented vehicle, `None` if it is in neither subtype table
    pub vehicle: Option<VehicleKind>,
    pub start_station: String,
    pub planned_destination: String,
    pub actual_destination: Option<String>,
    pub status: TripStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub cost: Option<f64>,
    pub carbon_saved: Option<f64>,
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartRental {
    pub user_id: i64,
    pub vehicle_id: i64,
    pub start_station: String,
    pub planned_destination: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndRental {
    pub end_station: String,
    pub actual_destination: String,
    pub rating: u8,
    pub status: TripStatus,
}

const SELECT_VEHICLE_TRIP: &str = "
    SELECT t.id, t.user_id, t.vehicle_id, t.origin, t.planned_destination,
           t.actual_destination, t.status, t.start_time, t.end_time, t.cost,
           t.carbon_saved, t.rating,
           b.vehicle_id, b.tire_status, s.vehicle_id, s.battery_level
    FROM vehicle_trips t
    JOIN individual_vehicles v ON v.id = t.vehicle_id
    LEFT JOIN bikes b ON b.vehicle_id = v.id
    LEFT JOIN scooters s ON s.vehicle_id = v.id";

fn vehicle_trip_from_row(row: &Row<'_>) -> rusqlite::Result<VehicleTrip> {
    Ok(VehicleTrip {
        id: row.get(0)?,
        user_id: row.get(1)?,
        vehicle_id: row.get(2)?,
        start_station: row.get(3)?,
        planned_destination: row.get(4)?,
        actual_destination: row.get(5)?,
        status: row.get(6)?,
        start_time: row.get(7)?,
        end_time: row.get(8)?,
        cost: row.get(9)?,
        carbon_saved: row.get(10)?,
        rating: row.get(11)?,
        vehicle: VehicleKind::from_columns(row.get(12)?, row.get(13)?, row.get(14)?, row.get(15)?),
    })
}

fn fetch_vehicle_trip(conn: &Connection, trip_id: i64) -> Result<VehicleTrip, TripError> {
    conn.query_row(
        &format!("{} WHERE t.id = ?1", SELECT_VEHICLE_TRIP),
        [trip_id],
        vehicle_trip_from_row,
    )
    .optional()?
    .ok_or_else(|| TripError::NotFound("Vehicle trip not found".to_string()))
}

/// Start renting an individual vehicle.
///
/// In one transaction: inserts an `in-progress` trip stamped with `now` and flips the
/// vehicle to `OutOfService`, undocking it from its station. The flip only succeeds if the
/// vehicle is still `Available`, so two concurrent rentals of the same vehicle cannot both
/// commit.
pub fn start_rental(
    conn: &mut Connection,
    cmd: &StartRental,
    now: DateTime<Utc>,
) -> Result<VehicleTrip, TripError> {
    let tx = conn.transaction()?;
    current::ensure_can_start(&tx, cmd.user_id)?;

    let known: Option<i64> = tx
        .query_row(
            "SELECT id FROM individual_vehicles WHERE id = ?1",
            [cmd.vehicle_id],
            |row| row.get(0),
        )
        .optional()?;
    if known.is_none() {
        return Err(TripError::NotFound(format!(
            "Vehicle {} not found",
            cmd.vehicle_id
        )));
    }

    tx.execute(
        "INSERT INTO vehicle_trips (user_id, vehicle_id, origin, planned_destination, status, start_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            cmd.user_id,
            cmd.vehicle_id,
            cmd.start_station,
            cmd.planned_destination,
            TripStatus::InProgress,
            now
        ],
    )?;
    let trip_id = tx.last_insert_rowid();

    let claimed = tx.execute(
        "UPDATE individual_vehicles SET status = ?1, station_id = NULL WHERE id = ?2 AND status = ?3",
        params![
            VehicleStatus::OutOfService,
            cmd.vehicle_id,
            VehicleStatus::Available
        ],
    )?;
    if claimed == 0 {
        // dropping the transaction discards the trip row
        return Err(TripError::VehicleUnavailable(cmd.vehicle_id));
    }

    let trip = fetch_vehicle_trip(&tx, trip_id)?;
    tx.commit()?;
    log::info!(
        "User {} started rental {} of vehicle {} at {}",
        cmd.user_id,
        trip_id,
        cmd.vehicle_id,
        cmd.start_station
    );
    Ok(trip)
}

/// Finish a rental, bill it and dock the vehicle at the end station.
///
/// Cost and carbon are derived from the time elapsed since the trip started
/// (see [`billing::rental_fare`]). If the end station is unknown or has no free dock the
/// trip is still closed and the vehicle released, but it is left without a station.
pub fn end_rental(
    conn: &mut Connection,
    trip_id: i64,
    cmd: &EndRental,
    now: DateTime<Utc>,
) -> Result<VehicleTrip, TripError> {
    let tx = conn.transaction()?;

    let (start_time, vehicle_id, price_per_minute, carbon_factor): (DateTime<Utc>, i64, f64, f64) = tx
        .query_row(
            "SELECT t.start_time, t.vehicle_id, v.price_per_minute, v.carbon_factor
             FROM vehicle_trips t
             JOIN individual_vehicles v ON v.id = t.vehicle_id
             WHERE t.id = ?1",
            [trip_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?
        .ok_or_else(|| TripError::NotFound("Vehicle trip not found".to_string()))?;

    let fare = billing::rental_fare(now - start_time, price_per_minute, carbon_factor);

    let updated = tx.execute(
        "UPDATE vehicle_trips
         SET end_time = ?1, actual_destination = ?2, cost = ?3, carbon_saved = ?4, rating = ?5, status = ?6
         WHERE id = ?7 AND status = ?8",
        params![
            now,
            cmd.actual_destination,
            fare.cost,
            fare.carbon_saved,
            cmd.rating,
            cmd.status,
            trip_id,
            TripStatus::InProgress
        ],
    )?;
    if updated == 0 {
        return Err(TripError::NotFound(
            "Vehicle trip not found or already finished".to_string(),
        ));
    }

    let station: Option<(i64, i64)> = tx
        .query_row(
            "SELECT id, capacity FROM stations WHERE name = ?1",
            [&cmd.end_station],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let dock = match station {
        Some((station_id, capacity)) => {
            let docked: i64 = tx.query_row(
                "SELECT COUNT(*) FROM individual_vehicles WHERE station_id = ?1",
                [station_id],
                |row| row.get(0),
            )?;
            if docked < capacity {
                Some(station_id)
            } else {
                log::warn!(
                    "Station '{}' is full ({} docks), vehicle {} released without a station",
                    cmd.end_station,
                    capacity,
                    vehicle_id
                );
                None
            }
        }
        None => {
            log::warn!(
                "End station '{}' not found, vehicle {} released without a station",
                cmd.end_station,
                vehicle_id
            );
            None
        }
    };
    tx.execute(
        "UPDATE individual_vehicles SET status = ?1, station_id = ?2 WHERE id = ?3",
        params![VehicleStatus::Available, dock, vehicle_id],
    )?;

    let trip = fetch_vehicle_trip(&tx, trip_id)?;
    tx.commit()?;
    log::info!(
        "Rental {} ended at {}: {:.2} km, cost {:.2}, {:.2} kg CO2 saved",
        trip_id,
        cmd.end_station,
        fare.distance_km,
        fare.cost,
        fare.carbon_saved
    );
    Ok(trip)
}

/// All rentals of a user, most recent first.
pub fn user_vehicle_trips(conn: &Connection, user_id: i64) -> Result<Vec<VehicleTrip>, TripError> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE t.user_id = ?1 ORDER BY t.start_time DESC, t.id DESC",
        SELECT_VEHICLE_TRIP
    ))?;
    let trips = stmt
        .query_map([user_id], vehicle_trip_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(trips)
}

pub(crate) fn in_progress_vehicle_trips(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<VehicleTrip>, TripError> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE t.user_id = ?1 AND t.status = ?2 ORDER BY t.start_time DESC, t.id DESC",
        SELECT_VEHICLE_TRIP
    ))?;
    let trips = stmt
        .query_map(params![user_id, TripStatus::InProgress], vehicle_trip_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(trips)
}
