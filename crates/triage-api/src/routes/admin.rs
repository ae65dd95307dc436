use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub enabled: bool,
}

/// Administrative availability toggle.
///
/// Diagnostic routes answer 503 while disabled. This is the only mutation
/// path for the switch; ordinary requests cannot flip it.
pub async fn set_availability(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AvailabilityRequest>,
) -> ApiResult<Json<AvailabilityResponse>> {
    state.verifier.authenticate_admin(&headers)?;

    state.set_enabled(req.enabled);
    tracing::info!(enabled = req.enabled, "service availability changed");

    Ok(Json(AvailabilityResponse {
        enabled: state.is_enabled(),
    }))
}
