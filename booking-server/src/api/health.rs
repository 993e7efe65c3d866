//! Health and sweeper status endpoints

use axum::extract::State;
use axum::Json;

use crate::engine::sweeper::SweeperStatus;
use crate::state::AppState;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "booking-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/sweeper/status
pub async fn sweeper_status(State(state): State<AppState>) -> Json<SweeperStatus> {
    let status = state.sweeper_status.read().await;
    Json(status.clone())
}
