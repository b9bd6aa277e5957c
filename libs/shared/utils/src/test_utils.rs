use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{AppointmentRequest, UserContact};

pub struct TestConfig {
    pub emias_base_url: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            emias_base_url: "http://localhost:18080".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Points both the upstream and the store at one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            emias_base_url: uri.to_string(),
            supabase_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            emias_base_url: self.emias_base_url.clone(),
            emias_timeout_seconds: 2,
            supabase_timeout_seconds: 1,
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            smtp_username: "watcher@example.com".to_string(),
            smtp_password: "test-password".to_string(),
            mail_from: "watcher@example.com".to_string(),
            ..AppConfig::default()
        }
    }
}

pub struct TestPatient {
    pub id: Uuid,
    pub oms_number: String,
    pub birth_date: NaiveDate,
    pub email: String,
}

impl Default for TestPatient {
    fn default() -> Self {
        Self::new("patient@example.com")
    }
}

impl TestPatient {
    pub fn new(email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            oms_number: "7700000000000001".to_string(),
            birth_date: date(1990, 5, 17),
            email: email.to_string(),
        }
    }

    pub fn with_oms(mut self, oms_number: &str) -> Self {
        self.oms_number = oms_number.to_string();
        self
    }

    pub fn to_contact(&self) -> UserContact {
        UserContact {
            id: self.id,
            oms_number: self.oms_number.clone(),
            birth_date: self.birth_date,
            email: self.email.clone(),
        }
    }

    /// A pending request for `resource_id` with the window given as
    /// `YYYY-MM-DD HH:MM:SS` strings.
    pub fn request(&self, speciality_id: &str, resource_id: i64, start: &str, end: &str) -> AppointmentRequest {
        AppointmentRequest::new(self.id, speciality_id, resource_id, at(start), at(end))
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn at(timestamp: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").expect("valid test timestamp")
}

pub struct MockEmiasResponses;

impl MockEmiasResponses {
    pub fn specialities_response() -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": "test",
            "result": [
                { "code": "69", "name": "Терапевт", "isMultipleLpuSpeciality": false },
                { "code": "2008", "name": "Хирург", "isMultipleLpuSpeciality": false }
            ]
        })
    }

    pub fn doctor(resource_id: i64, name: &str, complex_resource_ids: &[i64]) -> Value {
        let complex: Vec<Value> = complex_resource_ids
            .iter()
            .map(|id| json!({ "id": id, "name": format!("Кабинет {}", id) }))
            .collect();

        json!({
            "id": resource_id,
            "name": name,
            "lpuId": 10000421,
            "arSpecialityId": "69",
            "complexResource": complex
        })
    }

    pub fn doctors_response(doctors: Vec<Value>) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": "test",
            "result": doctors
        })
    }

    /// One day-group per distinct date, slots kept in the given order.
    pub fn fine_schedule_response(start_times: &[&str]) -> Value {
        let mut days: Vec<(String, Vec<Value>)> = Vec::new();

        for start in start_times {
            let day = start.get(..10).unwrap_or(start).to_string();
            let slot = json!({ "startTime": start, "endTime": start });

            match days.iter_mut().find(|(d, _)| *d == day) {
                Some((_, slots)) => slots.push(slot),
                None => days.push((day, vec![slot])),
            }
        }

        let schedule_of_day: Vec<Value> = days
            .into_iter()
            .map(|(day, slots)| {
                json!({
                    "date": day,
                    "scheduleBySlot": [ { "slot": slots } ]
                })
            })
            .collect();

        json!({
            "jsonrpc": "2.0",
            "id": "test",
            "result": { "scheduleOfDay": schedule_of_day }
        })
    }

    pub fn hospital_schedule_response(resource_id: i64, name: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "availableResource": [
                    {
                        "id": resource_id,
                        "name": name,
                        "schedule": [
                            { "date": "2024-03-01", "receptionInfo": [ { "start": "08:00", "end": "14:00" } ] }
                        ]
                    }
                ]
            }
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": "test",
            "error": {
                "code": 602,
                "message": message
            }
        })
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn request_row(request: &AppointmentRequest) -> Value {
        json!(request)
    }

    pub fn user_row(patient: &TestPatient) -> Value {
        json!({
            "id": patient.id,
            "oms_number": patient.oms_number,
            "birth_date": patient.birth_date.format("%Y-%m-%d").to_string(),
            "email": patient.email
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_mock_server("http://127.0.0.1:9999").to_app_config();

        assert_eq!(config.emias_base_url, "http://127.0.0.1:9999");
        assert_eq!(config.supabase_url, "http://127.0.0.1:9999");
        assert!(config.is_mail_configured());
        assert!(config.is_store_configured());
    }

    #[test]
    fn test_patient_request_window() {
        let patient = TestPatient::default();
        let request = patient.request("69", 1001, "2024-03-01 09:00:00", "2024-03-01 10:00:00");

        assert_eq!(request.user_id, patient.id);
        assert_eq!(request.start_time, at("2024-03-01 09:00:00"));
        assert!(request.is_pending());
    }

    #[test]
    fn test_fine_schedule_groups_by_day() {
        let response = MockEmiasResponses::fine_schedule_response(&[
            "2024-03-01T09:00:00+03:00",
            "2024-03-01T09:30:00+03:00",
            "2024-03-02T11:00:00+03:00",
        ]);

        let days = response["result"]["scheduleOfDay"].as_array().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["scheduleBySlot"][0]["slot"].as_array().unwrap().len(), 2);
    }
}
