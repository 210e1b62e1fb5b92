//! Read-only transport data: stations with their docked vehicles, and routes with their
//! stop sequences.

pub mod routes;
pub mod stations;

pub use routes::{public_transport_routes, RouteView};
pub use stations::{stations_with_vehicles, Location, StationView, VehicleView};
