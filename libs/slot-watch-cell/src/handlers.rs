use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use shared_models::error::AppError;

use crate::services::SlotPollerService;
use crate::{SlotWatchError, TickReport, WatcherStatus};

pub async fn get_status(State(poller): State<Arc<SlotPollerService>>) -> Json<WatcherStatus> {
    Json(poller.status().await)
}

/// Run one tick now, outside the interval.
pub async fn trigger_tick(
    State(poller): State<Arc<SlotPollerService>>,
) -> Result<Json<TickReport>, AppError> {
    info!("Manual tick requested");

    let report = poller.run_tick().await.map_err(|e| {
        if !matches!(e, SlotWatchError::TickInProgress) {
            warn!("Manual tick failed: {}", e);
        }
        AppError::from(e)
    })?;

    Ok(Json(report))
}

pub async fn health_check(State(poller): State<Arc<SlotPollerService>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "poller_running": poller.is_running()
    }))
}
