use serde::Serialize;
use std::collections::BTreeMap;

/// Body of every error response: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub database: bool,
    pub services: BTreeMap<&'static str, bool>,
    pub uptime_seconds: u64,
}
