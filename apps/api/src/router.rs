use std::sync::Arc;

use axum::{routing::get, Router};

use emias_cell::{emias_routes, EmiasClient};
use slot_watch_cell::{watcher_routes, SlotPollerService};

pub fn create_router(emias: Arc<EmiasClient>, poller: Arc<SlotPollerService>) -> Router {
    Router::new()
        .route("/", get(|| async { "EMIAS slot watcher is running!" }))
        .nest("/emias", emias_routes(emias))
        .nest("/watcher", watcher_routes(poller))
}
