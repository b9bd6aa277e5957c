use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use shared_config::AppConfig;

// =====================================================================================
// POLLER CONFIGURATION
// =====================================================================================

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub max_concurrent_requests: usize,
    /// Bound on all upstream lookups made for one request in one tick.
    pub request_timeout: Duration,
    /// Bound on each store call, so a hung backend cannot hold the tick guard.
    pub store_timeout: Duration,
}

impl PollerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_seconds.max(1)),
            max_concurrent_requests: config.poll_max_concurrent_requests.max(1),
            // Two upstream calls per request, each with its own client timeout.
            request_timeout: Duration::from_secs(config.emias_timeout_seconds.max(1) * 2),
            store_timeout: Duration::from_secs(config.supabase_timeout_seconds.max(1)),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            max_concurrent_requests: 4,
            request_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(10),
        }
    }
}

// =====================================================================================
// TICK REPORTING
// =====================================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RequestOutcome {
    Fulfilled { slot: NaiveDateTime },
    NoMatch,
    Skipped { reason: String, detail: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestReport {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub outcome: RequestOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pending: usize,
    pub fulfilled: usize,
    pub no_match: usize,
    pub skipped: usize,
    pub outcomes: Vec<RequestReport>,
}

impl TickReport {
    pub fn new(tick_id: Uuid, started_at: DateTime<Utc>, outcomes: Vec<RequestReport>) -> Self {
        let count = |pred: fn(&RequestOutcome) -> bool| {
            outcomes.iter().filter(|report| pred(&report.outcome)).count()
        };

        Self {
            tick_id,
            started_at,
            finished_at: Utc::now(),
            pending: outcomes.len(),
            fulfilled: count(|o| matches!(o, RequestOutcome::Fulfilled { .. })),
            no_match: count(|o| matches!(o, RequestOutcome::NoMatch)),
            skipped: count(|o| matches!(o, RequestOutcome::Skipped { .. })),
            outcomes,
        }
    }

    pub fn outcome_for(&self, request_id: Uuid) -> Option<&RequestOutcome> {
        self.outcomes
            .iter()
            .find(|report| report.request_id == request_id)
            .map(|report| &report.outcome)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WatcherStatus {
    pub running: bool,
    pub interval_seconds: u64,
    pub max_concurrent_requests: usize,
    pub last_tick: Option<TickReport>,
}
