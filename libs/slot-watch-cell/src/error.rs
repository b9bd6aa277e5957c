use thiserror::Error;
use uuid::Uuid;

use emias_cell::EmiasError;
use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum SlotWatchError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream rejected the request: {0}")]
    UpstreamRejected(String),

    #[error("Malformed upstream data: {0}")]
    MalformedUpstreamData(String),

    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    #[error("Request {0} was already transitioned by another writer")]
    PersistenceConflict(Uuid),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("A tick is already in progress")]
    TickInProgress,
}

impl SlotWatchError {
    /// Short label used in tick reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SlotWatchError::UpstreamUnavailable(_) => "upstream_unavailable",
            SlotWatchError::UpstreamRejected(_) => "upstream_rejected",
            SlotWatchError::MalformedUpstreamData(_) => "malformed_upstream_data",
            SlotWatchError::NotificationFailed(_) => "notification_failed",
            SlotWatchError::PersistenceConflict(_) => "persistence_conflict",
            SlotWatchError::Persistence(_) => "persistence",
            SlotWatchError::TickInProgress => "tick_in_progress",
        }
    }
}

impl From<EmiasError> for SlotWatchError {
    fn from(err: EmiasError) -> Self {
        match err {
            EmiasError::Unavailable(msg) => SlotWatchError::UpstreamUnavailable(msg),
            EmiasError::Rejected(msg) => SlotWatchError::UpstreamRejected(msg),
            EmiasError::Malformed(msg) => SlotWatchError::MalformedUpstreamData(msg),
        }
    }
}

impl From<StoreError> for SlotWatchError {
    fn from(err: StoreError) -> Self {
        SlotWatchError::Persistence(err.to_string())
    }
}

impl From<SlotWatchError> for AppError {
    fn from(err: SlotWatchError) -> Self {
        match err {
            SlotWatchError::TickInProgress => AppError::Conflict(err.to_string()),
            SlotWatchError::Persistence(_) => AppError::Database(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}
