use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::error::AppError;

use crate::models::{is_valid_oms_number, DoctorsQuery, PatientQuery, SlotsQuery};
use crate::services::EmiasClient;

fn check_oms(oms_number: &str) -> Result<(), AppError> {
    if is_valid_oms_number(oms_number) {
        Ok(())
    } else {
        Err(AppError::BadRequest("OMS number must be 16 digits".to_string()))
    }
}

pub async fn get_specialities(
    State(client): State<Arc<EmiasClient>>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<Value>, AppError> {
    check_oms(&query.oms_number)?;

    let specialities = client
        .lookup_specialities(&query.oms_number, query.birth_date)
        .await?;

    Ok(Json(json!({
        "specialities": specialities,
        "total": specialities.len()
    })))
}

pub async fn get_doctors(
    State(client): State<Arc<EmiasClient>>,
    Query(query): Query<DoctorsQuery>,
) -> Result<Json<Value>, AppError> {
    check_oms(&query.oms_number)?;

    let doctors = client
        .lookup_doctors(&query.oms_number, query.birth_date, &query.speciality_id)
        .await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

pub async fn get_doctor_slots(
    State(client): State<Arc<EmiasClient>>,
    Path(resource_id): Path<i64>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    check_oms(&query.oms_number)?;

    let slots = client
        .lookup_fine_schedule(
            &query.oms_number,
            query.birth_date,
            resource_id,
            query.complex_resource_id,
        )
        .await?;

    Ok(Json(json!({
        "resource_id": resource_id,
        "slots": slots,
        "total": slots.len()
    })))
}

pub async fn get_hospital_schedule(
    State(client): State<Arc<EmiasClient>>,
    Path(lpu_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    info!("Hospital schedule request for lpu {}", lpu_id);

    let schedule = client.lookup_hospital_schedule(lpu_id).await?;

    Ok(Json(json!({
        "lpu_id": lpu_id,
        "available_resource": schedule.available_resource
    })))
}

pub async fn get_cache_stats(State(client): State<Arc<EmiasClient>>) -> Json<Value> {
    Json(json!(client.schedule_cache_stats()))
}
