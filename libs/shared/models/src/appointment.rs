use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A patient's standing request to be told when a slot opens up with a given
/// doctor inside a desired window.
///
/// `start_time` and `end_time` are naive local timestamps, the same
/// representation the slot extractor produces, so the two compare directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub speciality_id: String,
    pub hospital_id: Option<i64>,
    pub available_resource_id: i64,
    pub complex_resource_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl AppointmentRequest {
    pub fn new(
        user_id: Uuid,
        speciality_id: impl Into<String>,
        available_resource_id: i64,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            speciality_id: speciality_id.into(),
            hospital_id: None,
            available_resource_id,
            complex_resource_id: None,
            doctor_name: None,
            start_time,
            end_time,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            fulfilled_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Fulfilled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Fulfilled)
    }

    /// Pending -> Fulfilled is the only legal move.
    pub fn can_transition_to(&self, target: RequestStatus) -> bool {
        matches!((self, target), (RequestStatus::Pending, RequestStatus::Fulfilled))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Fulfilled => "fulfilled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact and identity fields of the patient who owns a request. Read-only
/// here; the user-management side owns these rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserContact {
    pub id: Uuid,
    pub oms_number: String,
    pub birth_date: NaiveDate,
    pub email: String,
}

/// Result of the conditional "Pending -> Fulfilled" update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Transitioned,
    AlreadyTransitioned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_are_monotonic() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Fulfilled));
        assert!(!RequestStatus::Fulfilled.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Fulfilled.can_transition_to(RequestStatus::Fulfilled));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
        assert!(RequestStatus::Fulfilled.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&RequestStatus::Fulfilled).unwrap();
        assert_eq!(json, "\"fulfilled\"");

        let parsed: RequestStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, RequestStatus::Pending);
    }

    #[test]
    fn test_new_request_starts_pending() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let request = AppointmentRequest::new(Uuid::new_v4(), "69", 42, start, end);

        assert!(request.is_pending());
        assert!(request.fulfilled_at.is_none());
        assert_eq!(request.speciality_id, "69");
    }
}
