use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{get_status, health_check, trigger_tick};
use crate::services::SlotPollerService;

pub fn watcher_routes(poller: Arc<SlotPollerService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/tick", post(trigger_tick))
        .with_state(poller)
}
