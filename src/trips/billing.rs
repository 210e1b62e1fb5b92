//! Cost and carbon derivation for finished trips.
//!
//! Distances are simulated: rentals assume a constant cruising speed, rides assume a
//! fixed spacing between consecutive stops of a route.

use chrono::Duration;
use serde::Serialize;

/// Assumed average speed of a rented bike or scooter.
pub const AVERAGE_SPEED_KMH: f64 = 18.0;

/// Assumed distance between two consecutive stops of a route.
pub const STOP_SPACING_KM: f64 = 0.5;

/// Outcome of billing a trip. `cost` and `carbon_saved` are rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fare {
    pub distance_km: f64,
    pub cost: f64,
    pub carbon_saved: f64,
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bill an individual-vehicle rental by elapsed time.
///
/// # Parameters
/// - `elapsed`: time between start and end of the rental; negative spans count as zero
/// - `price_per_minute`: the vehicle's per-minute price
/// - `carbon_factor`: kg CO2 saved per km compared to a car
///
/// # Returns
/// The fare, with distance derived from [`AVERAGE_SPEED_KMH`]
pub fn rental_fare(elapsed: Duration, price_per_minute: f64, carbon_factor: f64) -> Fare {
    let minutes = (elapsed.num_milliseconds().max(0) as f64) / 60_000.0;
    let distance_km = (minutes / 60.0) * AVERAGE_SPEED_KMH;
    Fare {
        distance_km,
        cost: round2(minutes * price_per_minute),
        carbon_saved: round2(distance_km * carbon_factor),
    }
}

/// Bill a public transport ride: a flat fare, carbon from the number of stops travelled.
pub fn ride_fare(start_position: i64, end_position: i64, fare_per_ride: f64, carbon_factor: f64) -> Fare {
    let distance_km = (end_position - start_position).abs() as f64 * STOP_SPACING_KM;
    Fare {
        distance_km,
        cost: round2(fare_per_ride),
        carbon_saved: round2(distance_km * carbon_factor),
    }
}
