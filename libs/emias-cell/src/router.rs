use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::{
    get_cache_stats, get_doctor_slots, get_doctors, get_hospital_schedule, get_specialities,
};
use crate::services::EmiasClient;

pub fn emias_routes(client: Arc<EmiasClient>) -> Router {
    Router::new()
        .route("/specialities", get(get_specialities))
        .route("/doctors", get(get_doctors))
        .route("/doctors/{resource_id}/slots", get(get_doctor_slots))
        .route("/hospitals/{lpu_id}/schedule", get(get_hospital_schedule))
        .route("/cache/stats", get(get_cache_stats))
        .with_state(client)
}
