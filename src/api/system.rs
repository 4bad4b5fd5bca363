use axum::{Json, extract::State, response::IntoResponse};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use super::{AppState, HealthDto};
use crate::models::ServiceType;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    let database = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check could not reach the database: {}", e);
            false
        }
    };

    let services: BTreeMap<&'static str, bool> = ServiceType::ALL
        .into_iter()
        .map(|service| {
            (
                service.as_str(),
                state.lookup_service().is_available(service),
            )
        })
        .collect();

    Json(HealthDto {
        status: if database { "ok" } else { "degraded" },
        database,
        services,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}
