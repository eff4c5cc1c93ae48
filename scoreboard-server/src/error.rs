//! Mapping from scoreboard failures to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// Error returned by API handlers; rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Core(scoreboard::Error),
    /// Path id that is not 24 hex characters.
    MalformedId(String),
    /// A blocking scoreboard call panicked or was cancelled.
    Task(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedId(_) | ApiError::Core(scoreboard::Error::InvalidName) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Core(scoreboard::Error::DuplicateName(_)) => StatusCode::CONFLICT,
            ApiError::Core(scoreboard::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(scoreboard::Error::Storage(_)) | ApiError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Core(err) => err.to_string(),
            ApiError::MalformedId(raw) => format!("malformed participant id '{raw}'"),
            ApiError::Task(reason) => format!("request task failed: {reason}"),
        }
    }
}

impl From<scoreboard::Error> for ApiError {
    fn from(err: scoreboard::Error) -> Self {
        ApiError::Core(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Task(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(error = %message, "request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoreboard::core::types::ParticipantId;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ApiError::from(scoreboard::Error::InvalidName).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MalformedId("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(scoreboard::Error::DuplicateName("Ada".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(scoreboard::Error::NotFound(ParticipantId::new("x"))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(scoreboard::Error::Storage("disk".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Task("panicked".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_carries_status() {
        let response = ApiError::MalformedId("zz".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
