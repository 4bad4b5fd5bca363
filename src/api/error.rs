use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ErrorResponse;
use crate::services::LookupError;

#[derive(Debug)]
pub enum ApiError {
    ServiceUnavailable(String),

    ValidationError(String),

    ExternalApiError(String),

    DatabaseError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::ExternalApiError(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Upstream failures keep their description so callers can see what went wrong.
            ApiError::ExternalApiError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(error_message))).into_response()
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Unavailable(_) => ApiError::ServiceUnavailable(err.to_string()),
            LookupError::QueryTooShort => ApiError::ValidationError(err.to_string()),
            LookupError::Upstream(e) => ApiError::ExternalApiError(e.to_string()),
            LookupError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::UpstreamError;
    use crate::models::ServiceType;

    fn status_of(err: LookupError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_lookup_error_status_codes() {
        assert_eq!(
            status_of(LookupError::Unavailable(ServiceType::Suggest)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(LookupError::QueryTooShort), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(LookupError::Upstream(UpstreamError::Status {
                service: ServiceType::Geocode,
                status: 403,
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(LookupError::Database("locked".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_database_error_body_is_generic() {
        use http_body_util::BodyExt;

        let response =
            ApiError::from(LookupError::Database("disk I/O error at /var/db".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "A database error occurred" }));
    }

    #[test]
    fn test_upstream_description_is_kept() {
        let err = ApiError::from(LookupError::Upstream(UpstreamError::Request {
            service: ServiceType::Suggest,
            message: "connection refused".to_string(),
        }));
        assert!(matches!(
            err,
            ApiError::ExternalApiError(ref msg) if msg == "Yandex Suggest error: connection refused"
        ));
    }
}
