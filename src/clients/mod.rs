pub mod yandex;

pub use yandex::YandexClient;

use crate::models::ServiceType;
use thiserror::Error;

/// Transport-level failure talking to the upstream API. Never cached.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{} credential is not configured", .0.upstream_name())]
    MissingCredential(ServiceType),

    #[error("{} error: {message}", .service.upstream_name())]
    Request {
        service: ServiceType,
        message: String,
    },

    #[error("{} error: HTTP {status}", .service.upstream_name())]
    Status {
        service: ServiceType,
        status: u16,
    },

    #[error("{} error: invalid response body: {message}", .service.upstream_name())]
    Decode {
        service: ServiceType,
        message: String,
    },
}

/// Fetches a raw payload for one service. The payload is opaque to callers.
#[async_trait::async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch(
        &self,
        service: ServiceType,
        query: &str,
    ) -> Result<serde_json::Value, UpstreamError>;
}
