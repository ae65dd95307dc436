use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Returns the health status of the API and its dependencies
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let mut services = HashMap::new();

    match state.store.list_threads("_health_check", Some(1)).await {
        Ok(_) => services.insert("store".to_string(), "connected".to_string()),
        Err(_) => services.insert("store".to_string(), "disconnected".to_string()),
    };

    services.insert(
        "diagnostics".to_string(),
        if state.is_enabled() {
            "enabled".to_string()
        } else {
            "disabled".to_string()
        },
    );

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    }))
}
