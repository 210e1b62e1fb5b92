//! Client Trip State Controller: keeps a signed-in user's view of stations, routes and
//! trips in sync with the trip service.

pub mod api;
pub mod controller;
pub mod error;
pub mod http;
pub mod session;
pub mod simulator;

pub use api::TripApi;
pub use controller::{CarbonImpact, ControllerConfig, SyncStatus, TripController, TripSnapshot};
pub use error::ClientError;
pub use http::HttpTripApi;
pub use session::TripSession;
pub use simulator::{RideStep, AUTO_COMPLETION_RATING};
