use actix::MailboxError;
use thiserror::Error;

/// Failure of a trip-controller operation.
///
/// Every variant is terminal for the call that produced it: the controller logs it and
/// leaves its cached state as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The API answered with a non-success status
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("No trip in progress")]
    NoActiveTrip,
    #[error("Vehicle {0} is not docked at any known station")]
    UnknownVehicle(i64),
    #[error("Route {0} is not in the transport data")]
    UnknownRoute(i64),
    #[error("Stop '{stop}' is not on route {route_id}")]
    StopNotOnRoute { route_id: i64, stop: String },
    #[error("Trip controller is no longer running")]
    ControllerGone,
}

impl From<MailboxError> for ClientError {
    fn from(_: MailboxError) -> Self {
        ClientError::ControllerGone
    }
}
