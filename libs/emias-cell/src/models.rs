use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use shared_config::AppConfig;

// =====================================================================================
// CLIENT CONFIGURATION
// =====================================================================================

#[derive(Debug, Clone)]
pub struct EmiasClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub schedule_cache_ttl: Duration,
    pub schedule_cache_capacity: usize,
}

impl Default for EmiasClientConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl EmiasClientConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.emias_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.emias_timeout_seconds),
            schedule_cache_ttl: Duration::from_secs(config.schedule_cache_ttl_seconds),
            schedule_cache_capacity: config.schedule_cache_capacity,
        }
    }
}

// =====================================================================================
// WIRE ENVELOPE
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmiasMethod {
    Specialities,
    Doctors,
    HospitalSchedule,
    FineSchedule,
}

impl EmiasMethod {
    pub fn name(&self) -> &'static str {
        match self {
            EmiasMethod::Specialities => "getSpecialitiesInfo",
            EmiasMethod::Doctors => "getDoctorsInfo",
            EmiasMethod::HospitalSchedule => "get_lpu_schedule_info",
            EmiasMethod::FineSchedule => "getAvailableResourceScheduleInfo",
        }
    }

    /// Path relative to the configured base URL.
    pub fn path(&self) -> &'static str {
        match self {
            EmiasMethod::Specialities => "/eip5orch?getSpecialitiesInfo",
            EmiasMethod::Doctors => "/eip5orch?getDoctorsInfo",
            EmiasMethod::HospitalSchedule => "/eip",
            EmiasMethod::FineSchedule => "/eip5orch?getAvailableResourceScheduleInfo",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<P> {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: &'static str,
    pub params: P,
}

impl<P: Serialize> RpcRequest<P> {
    pub fn new(method: EmiasMethod, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Uuid::new_v4().to_string(),
            method: method.name(),
            params,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientParams {
    pub oms_number: String,
    pub birth_date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorsParams {
    pub oms_number: String,
    pub birth_date: String,
    pub speciality_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HospitalScheduleParams {
    pub lpu_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FineScheduleParams {
    pub oms_number: String,
    pub birth_date: String,
    pub available_resource_id: String,
    pub complex_resource_id: String,
}

pub fn format_birth_date(birth_date: NaiveDate) -> String {
    birth_date.format("%Y-%m-%d").to_string()
}

// =====================================================================================
// RESULT PAYLOADS
// =====================================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Speciality {
    /// Sent as a string by current upstream builds, as a number by older ones.
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub code: String,
    pub name: String,
}

fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or a number, got {}",
            other
        ))),
    }
}

/// A doctor (upstream "available resource") as listed for a speciality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub lpu_id: Option<i64>,
    #[serde(default)]
    pub complex_resource: Vec<ComplexResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplexResource {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HospitalSchedule {
    #[serde(default)]
    pub available_resource: Vec<HospitalResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalResource {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub schedule: Vec<DaySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: String,
    #[serde(default)]
    pub reception_info: Value,
}

/// Fine-grained schedule of one doctor/complex resource: day-groups, each
/// holding slot-groups of individual slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FineSchedule {
    #[serde(default)]
    pub schedule_of_day: Vec<DaySchedule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub schedule_by_slot: Vec<SlotGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotGroup {
    #[serde(default)]
    pub slot: Vec<RawSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawSlot {
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// One bookable start time, normalised to local wall-clock time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpstreamSlot {
    pub start: NaiveDateTime,
    pub complex_resource_id: i64,
}

// =====================================================================================
// LOOKUP ENDPOINT QUERIES
// =====================================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PatientQuery {
    pub oms_number: String,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorsQuery {
    pub oms_number: String,
    pub birth_date: NaiveDate,
    pub speciality_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotsQuery {
    pub oms_number: String,
    pub birth_date: NaiveDate,
    pub complex_resource_id: i64,
}

/// OMS policy numbers are exactly sixteen digits.
pub fn is_valid_oms_number(oms_number: &str) -> bool {
    oms_number.len() == 16 && oms_number.chars().all(|c| c.is_ascii_digit())
}
