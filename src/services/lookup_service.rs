//! Read-through cache lookups for the upstream geocoding services.
//!
//! A lookup checks the service credential, validates the query, serves a
//! cached payload when one exists and otherwise fetches, stores and returns
//! the upstream payload.

use crate::clients::UpstreamError;
use crate::models::{Provenance, ServiceType};
use serde::Serialize;
use thiserror::Error;

/// Minimum query length, in characters, after trimming.
pub const MIN_QUERY_CHARS: usize = 3;

/// Payload returned to the caller together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub result: serde_json::Value,
    pub source: Provenance,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{} service unavailable", .0.display_name())]
    Unavailable(ServiceType),

    #[error("Query must be at least {} characters", MIN_QUERY_CHARS)]
    QueryTooShort,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for LookupError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Trims the query and enforces the minimum length.
pub fn validate_query(raw: &str) -> Result<&str, LookupError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return Err(LookupError::QueryTooShort);
    }
    Ok(trimmed)
}

#[async_trait::async_trait]
pub trait LookupService: Send + Sync {
    /// Whether the service has a credential and accepts requests.
    fn is_available(&self, service: ServiceType) -> bool;

    /// Runs a single lookup. No step is retried.
    async fn lookup(&self, service: ServiceType, query: &str)
    -> Result<LookupResult, LookupError>;
}
