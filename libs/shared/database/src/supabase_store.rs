use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{AppointmentRequest, MarkOutcome, RequestStatus, UserContact};

use crate::store::{AppointmentStore, StoreError};
use crate::supabase::SupabaseClient;

const REQUESTS_TABLE: &str = "/rest/v1/appointment_requests";
const USERS_TABLE: &str = "/rest/v1/users";

/// `AppointmentStore` over the Supabase REST interface.
pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        Ok(Self {
            supabase: SupabaseClient::new(config)?,
        })
    }

    async fn request_exists(&self, request_id: Uuid) -> Result<bool, StoreError> {
        let path = format!("{}?id=eq.{}&select=id", REQUESTS_TABLE, request_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn pending_requests(&self) -> Result<Vec<AppointmentRequest>, StoreError> {
        let path = format!(
            "{}?status=eq.{}&order=created_at.asc",
            REQUESTS_TABLE,
            RequestStatus::Pending
        );

        let rows: Vec<AppointmentRequest> = self.supabase.request(Method::GET, &path, None).await?;
        debug!("Loaded {} pending appointment requests", rows.len());

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn mark_fulfilled(&self, request_id: Uuid) -> Result<MarkOutcome, StoreError> {
        // The status filter makes the PATCH a compare-and-set on the server.
        let path = format!(
            "{}?id=eq.{}&status=eq.{}",
            REQUESTS_TABLE,
            request_id,
            RequestStatus::Pending
        );

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let body = json!({
            "status": RequestStatus::Fulfilled,
            "fulfilled_at": Utc::now().to_rfc3339(),
        });

        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(body), Some(headers))
            .await?;

        if !updated.is_empty() {
            debug!("Request {} marked fulfilled", request_id);
            return Ok(MarkOutcome::Transitioned);
        }

        if self.request_exists(request_id).await? {
            Ok(MarkOutcome::AlreadyTransitioned)
        } else {
            Err(StoreError::RequestNotFound(request_id))
        }
    }

    async fn user_contact(&self, user_id: Uuid) -> Result<UserContact, StoreError> {
        let path = format!(
            "{}?id=eq.{}&select=id,oms_number,birth_date,email",
            USERS_TABLE, user_id
        );

        let mut rows: Vec<UserContact> = self.supabase.request(Method::GET, &path, None).await?;

        if rows.is_empty() {
            return Err(StoreError::UserNotFound(user_id));
        }

        Ok(rows.swap_remove(0))
    }
}
