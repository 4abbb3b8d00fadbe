//! Read-only signal status endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::config::SignalSettings;
use crate::error::{AppError, Result};
use crate::types::{ActiveSignal, PerformanceStats};
use crate::AppState;

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn new(data: T) -> Self {
        Self { data }
    }
}

/// Create the signals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/active", get(get_active))
        .route("/active/:id", get(get_active_by_id))
        .route("/stats", get(get_stats))
        .route("/settings", get(get_settings))
}

/// Signals awaiting resolution.
async fn get_active(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<ActiveSignal>>>> {
    Ok(Json(ApiResponse::new(state.engine.active_signals().await)))
}

/// A single active signal by id (`SYMBOL_HHMMSS`).
async fn get_active_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ActiveSignal>>> {
    let signal = state
        .engine
        .active_signal(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No active signal {}", id)))?;

    Ok(Json(ApiResponse::new(signal)))
}

/// Current stats window (since the last daily report).
async fn get_stats(State(state): State<AppState>) -> Result<Json<ApiResponse<PerformanceStats>>> {
    Ok(Json(ApiResponse::new(state.engine.stats().await)))
}

/// Effective signal settings after merging over defaults.
async fn get_settings(State(state): State<AppState>) -> Result<Json<ApiResponse<SignalSettings>>> {
    Ok(Json(ApiResponse::new(state.engine.settings().clone())))
}
