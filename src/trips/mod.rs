//! Trip lifecycle and billing.
//!
//! This module is the only writer of trip rows and vehicle status. Each operation opens
//! its own transaction on the connection it is given and commits only when every step
//! succeeded.

pub mod billing;
pub mod current;
pub mod error;
pub mod rental;
pub mod ride;

pub use current::{current_trip, CurrentTrip};
pub use error::{ErrorKind, TripError};
pub use rental::{end_rental, start_rental, user_vehicle_trips, EndRental, StartRental, VehicleTrip};
pub use ride::{
    advance_ride_stop, end_ride, start_ride, user_rides, EndRide, PublicTransportTrip, StartRide,
};
