/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use spindle_core::SpindleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing, invalid or stale credentials
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Domain(#[from] SpindleError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl From<spindle_storage::StorageError> for ServerError {
    fn from(err: spindle_storage::StorageError) -> Self {
        ServerError::Domain(err.into())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Domain(err.into())
    }
}

impl ServerError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ServerError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ServerError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Domain(err) => match err {
                SpindleError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    format!("There is no {} with the given ID ↔ {id}", entity.to_lowercase()),
                ),
                SpindleError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
                SpindleError::Conflict(msg) => (StatusCode::CONFLICT, msg),
                SpindleError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
                other => {
                    tracing::error!("Database error: {:?}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Something went wrong, please try again later".to_string(),
                    )
                }
            },
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            ServerError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ServerError::Jwt(ref e) => {
                tracing::warn!("JWT error: {:?}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    "Invalid token. Please log in again".to_string(),
                )
            }
            ServerError::Bcrypt(ref e) => {
                tracing::error!("Bcrypt error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Password error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let kind = if status.is_server_error() { "error" } else { "fail" };

        let body = Json(json!({
            "status": kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServerError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        assert_eq!(
            status_of(SpindleError::not_found("Album", "a1").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(SpindleError::forbidden("no").into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(SpindleError::conflict("dup").into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(SpindleError::invalid_input("bad").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SpindleError::Database("disk".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ServerError::Unauthenticated("who".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_store_failures_hide_details() {
        let (_, message) =
            ServerError::from(SpindleError::Database("no such table: albums".into()))
                .status_and_message();
        assert!(!message.contains("albums"));
    }
}
