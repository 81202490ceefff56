//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Responses carry a JSON
//! `{ "message": ... }` body; 5xx details stay in the logs and Sentry.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts},
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use souk_db::RepositoryError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Repository operation failed or was rejected.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// Status code and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Repository(err) => match err {
                RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
                RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                RepositoryError::Invalid(e) => (StatusCode::BAD_REQUEST, e.to_string()),
                RepositoryError::Rejected(e) if e.is_missing_resource() => {
                    (StatusCode::NOT_FOUND, e.to_string())
                }
                RepositoryError::Rejected(e) => (StatusCode::BAD_REQUEST, e.to_string()),
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body extractor whose rejections render as `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections render as `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejections render as `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use souk_core::order::OrderError;
    use souk_core::promo::PromoRejection;
    use souk_core::{DeliveryAreaId, OrderId};

    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |err: RepositoryError| AppError::from(err).status_and_message().0;

        assert_eq!(status(RepositoryError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(RepositoryError::Conflict("promo code already exists".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(OrderError::AlreadyConfirmed(OrderId::new(7)).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(OrderError::PromoRejected(PromoRejection::Inactive).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(OrderError::DeliveryAreaUnavailable(DeliveryAreaId::new(2)).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(RepositoryError::Database(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_message_is_kept() {
        let (_, message) =
            AppError::from(RepositoryError::Conflict("promo code already exists".into()))
                .status_and_message();
        assert_eq!(message, "promo code already exists");
    }

    #[test]
    fn test_database_message_is_hidden() {
        let (_, message) =
            AppError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut)).status_and_message();
        assert_eq!(message, "Internal server error");
    }
}
