use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use emias_cell::{extract_complex_resource_id, find_doctor, EmiasClient};
use shared_database::{AppointmentStore, StoreError};
use shared_models::{AppointmentRequest, MarkOutcome, UserContact};

use crate::error::SlotWatchError;
use crate::models::{PollerConfig, RequestOutcome, RequestReport, TickReport, WatcherStatus};
use crate::services::matcher::find_first_match;
use crate::services::notifier::Notifier;

enum SlotSearch {
    Matched { slot: NaiveDateTime, doctor_name: String },
    NoMatch,
    DoctorMissing,
}

/// Recurring poll-and-match loop over pending appointment requests.
///
/// Ticks never overlap: `run_tick` holds a guard for the whole tick and a
/// second caller gets `TickInProgress` instead of waiting. Within a tick,
/// requests are processed with bounded concurrency and a failure in one
/// never reaches the others.
pub struct SlotPollerService {
    config: PollerConfig,
    emias: Arc<EmiasClient>,
    store: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn Notifier>,
    tick_guard: tokio::sync::Mutex<()>,
    last_report: RwLock<Option<TickReport>>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SlotPollerService {
    pub fn new(
        config: PollerConfig,
        emias: Arc<EmiasClient>,
        store: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            emias,
            store,
            notifier,
            tick_guard: tokio::sync::Mutex::new(()),
            last_report: RwLock::new(None),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Spawns the interval task. The first tick fires immediately. Calling
    /// this while the task is alive does nothing.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Slot poller already running");
            return;
        }

        self.shutdown_tx.send_replace(false);
        let mut shutdown = self.shutdown_tx.subscribe();
        let poller = Arc::clone(self);

        info!(
            "Starting slot poller: every {}s, up to {} requests at a time",
            self.config.interval.as_secs(),
            self.config.max_concurrent_requests
        );

        *task = Some(tokio::spawn(async move {
            let mut ticker = interval(poller.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        match poller.run_tick().await {
                            Ok(_) => {}
                            Err(SlotWatchError::TickInProgress) => {
                                debug!("Previous tick still running, skipping this one");
                            }
                            Err(e) => error!("Tick failed: {}", e),
                        }
                    }
                }
            }

            info!("Slot poller stopped");
        }));
    }

    /// Signals the interval task and waits for it. A tick already in flight
    /// runs to completion first.
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let handle = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Slot poller task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn last_report(&self) -> Option<TickReport> {
        self.last_report.read().await.clone()
    }

    pub async fn status(&self) -> WatcherStatus {
        WatcherStatus {
            running: self.is_running(),
            interval_seconds: self.config.interval.as_secs(),
            max_concurrent_requests: self.config.max_concurrent_requests,
            last_tick: self.last_report().await,
        }
    }

    /// Runs one tick over every pending request. Fails with `TickInProgress`
    /// without doing anything if another tick holds the guard, and with
    /// `Persistence` if the pending set cannot be loaded.
    pub async fn run_tick(&self) -> Result<TickReport, SlotWatchError> {
        let _guard = self
            .tick_guard
            .try_lock()
            .map_err(|_| SlotWatchError::TickInProgress)?;

        let report = self.execute_tick(Uuid::new_v4()).await?;
        *self.last_report.write().await = Some(report.clone());

        Ok(report)
    }

    #[instrument(skip(self))]
    async fn execute_tick(&self, tick_id: Uuid) -> Result<TickReport, SlotWatchError> {
        let started_at = Utc::now();

        let pending: Vec<AppointmentRequest> = self
            .with_store_timeout("loading pending requests", self.store.pending_requests())
            .await?
            .into_iter()
            .filter(AppointmentRequest::is_pending)
            .collect();

        debug!("Tick picked up {} pending requests", pending.len());

        let outcomes: Vec<RequestReport> = stream::iter(pending)
            .map(|request| async move {
                let outcome = match self.process_request(&request).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(request_id = %request.id, "Skipping request this tick: {}", e);
                        RequestOutcome::Skipped {
                            reason: e.kind().to_string(),
                            detail: e.to_string(),
                        }
                    }
                };

                RequestReport { request_id: request.id, outcome }
            })
            .buffered(self.config.max_concurrent_requests.max(1))
            .collect()
            .await;

        let report = TickReport::new(tick_id, started_at, outcomes);
        info!(
            "Tick finished: {} pending, {} fulfilled, {} without match, {} skipped",
            report.pending, report.fulfilled, report.no_match, report.skipped
        );

        Ok(report)
    }

    /// Notification goes out before the commit. A failed send leaves the
    /// request pending; a crash between send and commit means a duplicate
    /// mail on a later tick rather than a lost match.
    #[instrument(skip(self, request), fields(request_id = %request.id))]
    async fn process_request(&self, request: &AppointmentRequest) -> Result<RequestOutcome, SlotWatchError> {
        let contact = self
            .with_store_timeout("loading user contact", self.store.user_contact(request.user_id))
            .await?;

        let search = timeout(self.config.request_timeout, self.search_slot(request, &contact))
            .await
            .map_err(|_| {
                SlotWatchError::UpstreamUnavailable(format!(
                    "lookups did not finish within {}s",
                    self.config.request_timeout.as_secs()
                ))
            })??;

        let (slot, doctor_name) = match search {
            SlotSearch::Matched { slot, doctor_name } => (slot, doctor_name),
            SlotSearch::NoMatch => return Ok(RequestOutcome::NoMatch),
            SlotSearch::DoctorMissing => {
                return Ok(RequestOutcome::Skipped {
                    reason: "doctor_not_listed".to_string(),
                    detail: format!(
                        "resource {} not offered for speciality {}",
                        request.available_resource_id, request.speciality_id
                    ),
                });
            }
        };

        self.notifier.notify(&contact.email, &doctor_name, slot).await?;

        match self
            .with_store_timeout("marking request fulfilled", self.store.mark_fulfilled(request.id))
            .await?
        {
            MarkOutcome::Transitioned => {
                info!("Request fulfilled with slot {}", slot);
                Ok(RequestOutcome::Fulfilled { slot })
            }
            MarkOutcome::AlreadyTransitioned => Err(SlotWatchError::PersistenceConflict(request.id)),
        }
    }

    async fn with_store_timeout<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, SlotWatchError> {
        match timeout(self.config.store_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SlotWatchError::Persistence(format!(
                "{} did not finish within {}s",
                operation,
                self.config.store_timeout.as_secs_f32()
            ))),
        }
    }

    async fn search_slot(
        &self,
        request: &AppointmentRequest,
        contact: &UserContact,
    ) -> Result<SlotSearch, SlotWatchError> {
        let doctors = self
            .emias
            .lookup_doctors(&contact.oms_number, contact.birth_date, &request.speciality_id)
            .await?;

        let Some(doctor) = find_doctor(&doctors, request.available_resource_id) else {
            return Ok(SlotSearch::DoctorMissing);
        };

        let Some(complex_resource_id) = extract_complex_resource_id(doctor) else {
            debug!("Doctor {} has no complex resource", doctor.id);
            return Ok(SlotSearch::NoMatch);
        };

        let slots = self
            .emias
            .lookup_fine_schedule(
                &contact.oms_number,
                contact.birth_date,
                request.available_resource_id,
                complex_resource_id,
            )
            .await?;

        let starts: Vec<NaiveDateTime> = slots.iter().map(|slot| slot.start).collect();

        Ok(match find_first_match(request.start_time, request.end_time, &starts) {
            Some(slot) => SlotSearch::Matched {
                slot,
                doctor_name: request
                    .doctor_name
                    .clone()
                    .unwrap_or_else(|| doctor.name.clone()),
            },
            None => SlotSearch::NoMatch,
        })
    }
}
