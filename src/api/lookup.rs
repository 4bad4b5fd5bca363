use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::models::ServiceType;
use crate::services::LookupResult;

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    #[serde(default)]
    pub query: String,
}

pub async fn geocode(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResult>, ApiError> {
    lookup(&state, ServiceType::Geocode, &params.query).await
}

pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResult>, ApiError> {
    lookup(&state, ServiceType::Suggest, &params.query).await
}

async fn lookup(
    state: &AppState,
    service: ServiceType,
    query: &str,
) -> Result<Json<LookupResult>, ApiError> {
    let result = state.lookup_service().lookup(service, query).await?;
    Ok(Json(result))
}
