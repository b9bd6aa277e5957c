use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared_models::{AppointmentRequest, MarkOutcome, UserContact};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Appointment request not found: {0}")]
    RequestNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Durable home of appointment requests and the contacts that own them.
///
/// `mark_fulfilled` must be an atomic conditional update: it flips the row
/// only while it is still pending and reports `AlreadyTransitioned`
/// otherwise, so two writers can never both claim the same request.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn pending_requests(&self) -> Result<Vec<AppointmentRequest>, StoreError>;

    async fn mark_fulfilled(&self, request_id: Uuid) -> Result<MarkOutcome, StoreError>;

    async fn user_contact(&self, user_id: Uuid) -> Result<UserContact, StoreError>;
}
