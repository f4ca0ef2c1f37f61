use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::service::ServiceError;

/// An error ready to cross the HTTP boundary: a status code and a one-line
/// plain-text body. Backend failures are logged server-side and collapsed
/// to a generic message so internals never leak to callers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// A 400 with the given message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::ChunkTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::DropNotFound | ServiceError::ChunkNotFound => StatusCode::NOT_FOUND,
            ServiceError::Expired | ServiceError::LimitReached => StatusCode::GONE,
            ServiceError::Integrity { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Metadata(_) | ServiceError::Storage(_) | ServiceError::Admission(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &err {
            ServiceError::Metadata(_) | ServiceError::Storage(_) | ServiceError::Admission(_) => {
                error!(error = %err, "request failed on a backend");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };

        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
