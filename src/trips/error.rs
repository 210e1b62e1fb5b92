use thiserror::Error;

/// Broad category of a [`TripError`], used to pick the HTTP status and log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    BusinessRule,
    Compute,
    Infra,
}

/// An error raised by the trip and billing operations.
///
/// Every operation runs inside a transaction that is rolled back when one of these is
/// returned.
#[derive(Error, Debug)]
pub enum TripError {
    /// A required field is missing or malformed
    #[error("{0}")]
    InvalidInput(String),
    /// A referenced trip, vehicle, route, stop or user does not exist
    #[error("{0}")]
    NotFound(String),
    /// No collective vehicle on the route has status `Available`
    #[error("No vehicles are available on route {0} right now")]
    NoVehicleAvailable(i64),
    /// The individual vehicle is already rented or out of service
    #[error("Vehicle {0} is not available")]
    VehicleUnavailable(i64),
    /// The user already has a rental or a ride in progress
    #[error("User {0} already has a trip in progress")]
    ActiveTripExists(i64),
    /// The simulated distance of a ride cannot be determined
    #[error("{0}")]
    Compute(String),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl TripError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TripError::InvalidInput(_) => ErrorKind::InvalidInput,
            TripError::NotFound(_) => ErrorKind::NotFound,
            TripError::NoVehicleAvailable(_)
            | TripError::VehicleUnavailable(_)
            | TripError::ActiveTripExists(_) => ErrorKind::BusinessRule,
            TripError::Compute(_) => ErrorKind::Compute,
            TripError::Sqlite(_) | TripError::Serde(_) => ErrorKind::Infra,
        }
    }

    pub(crate) fn missing(what: &str) -> TripError {
        TripError::InvalidInput(format!("Missing required fields to {}", what))
    }
}
