use rusqlite::{params, Connection, OptionalExtension};

use crate::store::TripStatus;

use super::error::TripError;
use super::rental::{self, VehicleTrip};
use super::ride::{self, PublicTransportTrip};

/// The trip a user currently has in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentTrip {
    Vehicle(VehicleTrip),
    PublicTransport(PublicTransportTrip),
}

/// Look up the user's in-progress trip, rentals first.
///
/// Users can only hold one trip at a time, so finding more than one in-progress row is a
/// data-integrity problem: it is logged and the most recent rental wins.
pub fn current_trip(conn: &Connection, user_id: i64) -> Result<Option<CurrentTrip>, TripError> {
    let rentals = rental::in_progress_vehicle_trips(conn, user_id)?;
    let rides = ride::in_progress_rides(conn, user_id)?;

    if rentals.len() + rides.len() > 1 {
        log::warn!(
            "User {} has {} rentals and {} rides in progress, expected at most one trip",
            user_id,
            rentals.len(),
            rides.len()
        );
    }

    if let Some(trip) = rentals.into_iter().next() {
        return Ok(Some(CurrentTrip::Vehicle(trip)));
    }
    Ok(rides.into_iter().next().map(CurrentTrip::PublicTransport))
}

/// Check that `user_id` exists and holds no trip in progress of either kind.
pub(crate) fn ensure_can_start(conn: &Connection, user_id: i64) -> Result<(), TripError> {
    let known: Option<i64> = conn
        .query_row("SELECT id FROM users WHERE id = ?1", [user_id], |row| row.get(0))
        .optional()?;
    if known.is_none() {
        return Err(TripError::NotFound(format!("User {} not found", user_id)));
    }

    let active: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM vehicle_trips WHERE user_id = ?1 AND status = ?2)
              + (SELECT COUNT(*) FROM public_transport_trips WHERE user_id = ?1 AND status = ?2)",
        params![user_id, TripStatus::InProgress],
        |row| row.get(0),
    )?;
    if active > 0 {
        return Err(TripError::ActiveTripExists(user_id));
    }
    Ok(())
}
