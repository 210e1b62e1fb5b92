use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::api::ErrorBody;
use crate::trips::{ErrorKind, TripError};
use crate::users::UserError;

fn message_response(status: StatusCode, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody { message })
}

impl ResponseError for TripError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidInput | ErrorKind::BusinessRule => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Compute | ErrorKind::Infra => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self.kind() {
            ErrorKind::Compute => {
                log::error!("Trip computation failed: {}", self);
                "Could not compute the trip distance".to_string()
            }
            ErrorKind::Infra => {
                log::error!("Trip operation failed: {}", self);
                "Internal server error".to_string()
            }
            _ => {
                log::debug!("Trip request rejected: {}", self);
                self.to_string()
            }
        };
        message_response(self.status_code(), message)
    }
}

impl ResponseError for UserError {
    fn status_code(&self) -> StatusCode {
        match self {
            UserError::InvalidInput(_) | UserError::InvalidCredentials => StatusCode::BAD_REQUEST,
            UserError::EmailTaken => StatusCode::CONFLICT,
            UserError::Sqlite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            UserError::Sqlite(e) => {
                log::error!("User operation failed: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        message_response(self.status_code(), message)
    }
}
