//! Pure helpers that turn upstream payloads into comparable values.
//!
//! Slot start times arrive with a UTC offset. They are parsed and then the
//! offset is dropped, keeping the wall-clock reading, because requested
//! windows are stored as naive local time in the same zone.

use chrono::{DateTime, NaiveDateTime};

use crate::error::EmiasError;
use crate::models::{DoctorRecord, FineSchedule, UpstreamSlot};

pub fn find_doctor(doctors: &[DoctorRecord], resource_id: i64) -> Option<&DoctorRecord> {
    doctors.iter().find(|doctor| doctor.id == resource_id)
}

/// First complex resource of the doctor, if any. A doctor without one has
/// nothing bookable at slot level.
pub fn extract_complex_resource_id(doctor: &DoctorRecord) -> Option<i64> {
    doctor.complex_resource.first().map(|resource| resource.id)
}

pub fn parse_slot_time(raw: &str) -> Result<NaiveDateTime, EmiasError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|parsed| parsed.naive_local())
        .map_err(|e| EmiasError::Malformed(format!("bad slot start time {:?}: {}", raw, e)))
}

/// Start times in upstream order. Only the first slot-group of each day is
/// read; a day without one contributes nothing. Any unparsable timestamp
/// fails the whole extraction.
pub fn extract_slots(schedule: &FineSchedule) -> Result<Vec<NaiveDateTime>, EmiasError> {
    schedule
        .schedule_of_day
        .iter()
        .filter_map(|day| day.schedule_by_slot.first())
        .flat_map(|group| group.slot.iter())
        .map(|slot| parse_slot_time(&slot.start_time))
        .collect()
}

pub fn extract_upstream_slots(
    schedule: &FineSchedule,
    complex_resource_id: i64,
) -> Result<Vec<UpstreamSlot>, EmiasError> {
    Ok(extract_slots(schedule)?
        .into_iter()
        .map(|start| UpstreamSlot { start, complex_resource_id })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::models::ComplexResource;

    fn schedule(value: serde_json::Value) -> FineSchedule {
        serde_json::from_value(value).unwrap()
    }

    fn naive(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_extract_keeps_wall_clock_and_order() {
        let fine = schedule(json!({
            "scheduleOfDay": [{
                "date": "2024-03-01",
                "scheduleBySlot": [{ "slot": [
                    { "startTime": "2024-03-01T09:00:00+03:00" },
                    { "startTime": "2024-03-01T09:30:00+03:00" }
                ]}]
            }]
        }));

        let slots = extract_slots(&fine).unwrap();
        assert_eq!(slots, vec![naive(9, 0), naive(9, 30)]);
    }

    #[test]
    fn test_extract_preserves_non_chronological_order() {
        let fine = schedule(json!({
            "scheduleOfDay": [
                { "scheduleBySlot": [{ "slot": [{ "startTime": "2024-03-01T11:00:00+03:00" }] }] },
                { "scheduleBySlot": [{ "slot": [{ "startTime": "2024-03-01T08:00:00+03:00" }] }] }
            ]
        }));

        assert_eq!(extract_slots(&fine).unwrap(), vec![naive(11, 0), naive(8, 0)]);
    }

    #[test]
    fn test_extract_reads_only_first_slot_group() {
        let fine = schedule(json!({
            "scheduleOfDay": [
                { "scheduleBySlot": [
                    { "slot": [{ "startTime": "2024-03-01T09:00:00+03:00" }] },
                    { "slot": [{ "startTime": "2024-03-01T15:00:00+03:00" }] }
                ]},
                { "scheduleBySlot": [] }
            ]
        }));

        assert_eq!(extract_slots(&fine).unwrap(), vec![naive(9, 0)]);
    }

    #[test]
    fn test_malformed_timestamp_fails_everything() {
        let fine = schedule(json!({
            "scheduleOfDay": [{ "scheduleBySlot": [{ "slot": [
                { "startTime": "2024-03-01T09:00:00+03:00" },
                { "startTime": "tomorrow morning" }
            ]}]}]
        }));

        assert_matches!(extract_slots(&fine), Err(EmiasError::Malformed(_)));
    }

    #[test]
    fn test_offset_without_colon_is_accepted() {
        assert_eq!(parse_slot_time("2024-03-01T09:15:00+0300").unwrap(), naive(9, 15));
        assert_eq!(parse_slot_time("2024-03-01T09:15:00Z").unwrap(), naive(9, 15));
    }

    #[test]
    fn test_empty_schedule_has_no_slots() {
        let fine = schedule(json!({ "scheduleOfDay": [] }));
        assert!(extract_slots(&fine).unwrap().is_empty());
    }

    #[test]
    fn test_complex_resource_takes_first() {
        let mut doctor = DoctorRecord {
            id: 1001,
            name: "Петров П.П.".to_string(),
            lpu_id: Some(10000421),
            complex_resource: vec![],
        };
        assert_eq!(extract_complex_resource_id(&doctor), None);

        doctor.complex_resource = vec![
            ComplexResource { id: 77, name: None },
            ComplexResource { id: 78, name: None },
        ];
        assert_eq!(extract_complex_resource_id(&doctor), Some(77));
    }

    #[test]
    fn test_upstream_slots_carry_complex_resource() {
        let fine = schedule(json!({
            "scheduleOfDay": [{ "scheduleBySlot": [{ "slot": [
                { "startTime": "2024-03-01T09:00:00+03:00" }
            ]}]}]
        }));

        let slots = extract_upstream_slots(&fine, 77).unwrap();
        assert_eq!(slots, vec![UpstreamSlot { start: naive(9, 0), complex_resource_id: 77 }]);
    }
}
