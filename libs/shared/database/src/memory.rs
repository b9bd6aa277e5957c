use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::{AppointmentRequest, MarkOutcome, RequestStatus, UserContact};

use crate::store::{AppointmentStore, StoreError};

/// Process-local store. Used when no durable backend is configured and by
/// the test suites.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    requests: RwLock<HashMap<Uuid, AppointmentRequest>>,
    contacts: RwLock<HashMap<Uuid, UserContact>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_request(&self, request: AppointmentRequest) {
        self.requests.write().await.insert(request.id, request);
    }

    pub async fn insert_contact(&self, contact: UserContact) {
        self.contacts.write().await.insert(contact.id, contact);
    }

    pub async fn get_request(&self, request_id: Uuid) -> Option<AppointmentRequest> {
        self.requests.read().await.get(&request_id).cloned()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn pending_requests(&self) -> Result<Vec<AppointmentRequest>, StoreError> {
        let requests = self.requests.read().await;

        let mut pending: Vec<AppointmentRequest> = requests
            .values()
            .filter(|request| request.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|request| request.created_at);

        Ok(pending)
    }

    async fn mark_fulfilled(&self, request_id: Uuid) -> Result<MarkOutcome, StoreError> {
        let mut requests = self.requests.write().await;

        let request = requests
            .get_mut(&request_id)
            .ok_or(StoreError::RequestNotFound(request_id))?;

        if !request.status.can_transition_to(RequestStatus::Fulfilled) {
            return Ok(MarkOutcome::AlreadyTransitioned);
        }

        request.status = RequestStatus::Fulfilled;
        request.fulfilled_at = Some(Utc::now());

        Ok(MarkOutcome::Transitioned)
    }

    async fn user_contact(&self, user_id: Uuid) -> Result<UserContact, StoreError> {
        self.contacts
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::UserNotFound(user_id))
    }
}
