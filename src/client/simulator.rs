//! Simulated progress of a bus or tram ride.
//!
//! There is no live vehicle feed: every tick of the controller moves the ride one stop
//! along its route snapshot until the planned destination is reached.

use chrono::{DateTime, Utc};

use crate::store::TripStatus;
use crate::trips::PublicTransportTrip;

/// Rating submitted when a ride completes on its own, since nobody was asked.
pub const AUTO_COMPLETION_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideStep {
    /// Nothing to simulate: the ride is finished or has no stops
    Idle,
    /// Move to this stop index and persist it
    Advance(usize),
    /// The planned destination is reached at this index
    Arrive { destination_index: usize },
}

/// Decide what the next tick does to `ride`.
///
/// A planned destination missing from the snapshot is treated as the last stop, and a
/// destination behind the current stop completes the ride where it is.
pub fn next_step(ride: &PublicTransportTrip) -> RideStep {
    if ride.status != TripStatus::InProgress || ride.full_route.is_empty() {
        return RideStep::Idle;
    }
    let destination = ride
        .destination_index()
        .unwrap_or(ride.full_route.len() - 1);
    let next = ride.current_station_index + 1;
    if next >= destination {
        RideStep::Arrive {
            destination_index: destination.max(ride.current_station_index),
        }
    } else {
        RideStep::Advance(next)
    }
}

/// Mark the ride completed at its planned destination without waiting for the server.
pub fn complete_locally(ride: &mut PublicTransportTrip, destination_index: usize, now: DateTime<Utc>) {
    ride.status = TripStatus::Completed;
    ride.end_time = Some(now);
    ride.actual_destination = Some(ride.planned_destination.clone());
    ride.current_station_index = destination_index;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TransportType;

    fn ride(planned: &str, index: usize) -> PublicTransportTrip {
        PublicTransportTrip {
            id: 1,
            user_id: 1,
            collective_vehicle_id: 1,
            route_id: 1,
            route_name: "Line 1".to_string(),
            transport_type: TransportType::Bus,
            start_station: "Central Plaza".to_string(),
            planned_destination: planned.to_string(),
            actual_destination: None,
            current_station_index: index,
            full_route: ["Central Plaza", "Market Street", "City Hall", "Riverside Park"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            status: TripStatus::InProgress,
            start_time: Utc::now(),
            end_time: None,
            cost: None,
            carbon_saved: None,
            rating: None,
        }
    }

    #[test]
    fn advances_one_stop_per_tick() {
        assert_eq!(next_step(&ride("Riverside Park", 0)), RideStep::Advance(1));
        assert_eq!(next_step(&ride("Riverside Park", 1)), RideStep::Advance(2));
        assert_eq!(
            next_step(&ride("Riverside Park", 2)),
            RideStep::Arrive { destination_index: 3 }
        );
    }

    #[test]
    fn arrives_when_next_stop_is_the_destination() {
        assert_eq!(
            next_step(&ride("Market Street", 0)),
            RideStep::Arrive { destination_index: 1 }
        );
    }

    #[test]
    fn destination_behind_completes_in_place() {
        assert_eq!(
            next_step(&ride("Central Plaza", 2)),
            RideStep::Arrive { destination_index: 2 }
        );
    }

    #[test]
    fn unknown_destination_runs_to_the_last_stop() {
        assert_eq!(next_step(&ride("Nowhere", 1)), RideStep::Advance(2));
        assert_eq!(
            next_step(&ride("Nowhere", 2)),
            RideStep::Arrive { destination_index: 3 }
        );
    }

    #[test]
    fn finished_rides_do_not_move() {
        let mut finished = ride("City Hall", 0);
        complete_locally(&mut finished, 2, Utc::now());
        assert_eq!(finished.actual_destination.as_deref(), Some("City Hall"));
        assert_eq!(finished.current_station_index, 2);
        assert_eq!(next_step(&finished), RideStep::Idle);
    }
}
