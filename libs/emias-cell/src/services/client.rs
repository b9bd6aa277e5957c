use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use shared_config::AppConfig;

use crate::error::EmiasError;
use crate::models::{
    format_birth_date, DoctorRecord, DoctorsParams, EmiasClientConfig, EmiasMethod, FineSchedule,
    FineScheduleParams, HospitalSchedule, HospitalScheduleParams, PatientParams, RpcRequest,
    RpcResponse, Speciality, UpstreamSlot,
};
use crate::services::cache::{CacheStats, ScheduleCache};
use crate::services::extractor::extract_upstream_slots;

/// Typed wrapper over the EMIAS JSON-RPC endpoints.
///
/// Every call is bounded by the configured timeout. Hospital schedules are
/// cached by hospital id; nothing else is. Concurrent misses for one
/// hospital share a single upstream fetch.
pub struct EmiasClient {
    client: Client,
    base_url: String,
    schedule_cache: ScheduleCache<i64, Arc<HospitalSchedule>>,
    schedule_fetches: Mutex<HashMap<i64, Arc<OnceCell<Arc<HospitalSchedule>>>>>,
}

impl EmiasClient {
    pub fn new(config: EmiasClientConfig) -> Result<Self, EmiasError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmiasError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            schedule_cache: ScheduleCache::new(
                config.schedule_cache_ttl,
                config.schedule_cache_capacity,
            ),
            schedule_fetches: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, EmiasError> {
        Self::new(EmiasClientConfig::from_app_config(config))
    }

    async fn call<P, T>(&self, method: EmiasMethod, params: P) -> Result<T, EmiasError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, method.path());
        let envelope = RpcRequest::new(method, params);
        debug!(method = method.name(), call_id = %envelope.id, "Calling EMIAS");

        let response = self
            .client
            .post(&url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| {
                warn!("EMIAS {} transport failure: {}", method.name(), e);
                EmiasError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("EMIAS {} answered with HTTP {}", method.name(), status);
            return Err(EmiasError::Unavailable(format!("HTTP {}", status)));
        }

        let body: RpcResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                EmiasError::Unavailable(e.to_string())
            } else {
                EmiasError::Malformed(format!("{}: {}", method.name(), e))
            }
        })?;

        if let Some(error) = body.error {
            debug!("EMIAS {} rejected the call: {}", method.name(), error.message);
            return Err(EmiasError::Rejected(error.message));
        }

        let result = body.result.ok_or_else(|| {
            EmiasError::Malformed(format!("{}: response has neither result nor error", method.name()))
        })?;

        serde_json::from_value(result)
            .map_err(|e| EmiasError::Malformed(format!("{}: {}", method.name(), e)))
    }

    pub async fn lookup_specialities(
        &self,
        oms_number: &str,
        birth_date: NaiveDate,
    ) -> Result<Vec<Speciality>, EmiasError> {
        self.call(
            EmiasMethod::Specialities,
            PatientParams {
                oms_number: oms_number.to_string(),
                birth_date: format_birth_date(birth_date),
            },
        )
        .await
    }

    #[instrument(skip(self, oms_number, birth_date))]
    pub async fn lookup_doctors(
        &self,
        oms_number: &str,
        birth_date: NaiveDate,
        speciality_id: &str,
    ) -> Result<Vec<DoctorRecord>, EmiasError> {
        self.call(
            EmiasMethod::Doctors,
            DoctorsParams {
                oms_number: oms_number.to_string(),
                birth_date: format_birth_date(birth_date),
                speciality_id: speciality_id.to_string(),
            },
        )
        .await
    }

    /// Schedule summary of a whole hospital. Served from the cache while the
    /// entry is fresh; errors are never cached. Callers that miss while a
    /// fetch for the same hospital is in flight wait for its result.
    pub async fn lookup_hospital_schedule(&self, lpu_id: i64) -> Result<Arc<HospitalSchedule>, EmiasError> {
        if let Some(cached) = self.schedule_cache.get(&lpu_id) {
            debug!("Hospital schedule {} served from cache", lpu_id);
            return Ok(cached);
        }

        let fetch = {
            let mut fetches = self.schedule_fetches.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(fetches.entry(lpu_id).or_default())
        };

        let result = fetch
            .get_or_try_init(|| async {
                let schedule: HospitalSchedule = self
                    .call(EmiasMethod::HospitalSchedule, HospitalScheduleParams { lpu_id })
                    .await?;

                let schedule = Arc::new(schedule);
                self.schedule_cache.insert(lpu_id, Arc::clone(&schedule));
                Ok::<_, EmiasError>(schedule)
            })
            .await
            .map(Arc::clone);

        // Later callers go through the cache, or start a fresh fetch after an error.
        let mut fetches = self.schedule_fetches.lock().unwrap_or_else(PoisonError::into_inner);
        if fetches.get(&lpu_id).is_some_and(|current| Arc::ptr_eq(current, &fetch)) {
            fetches.remove(&lpu_id);
        }

        result
    }

    pub async fn fetch_fine_schedule(
        &self,
        oms_number: &str,
        birth_date: NaiveDate,
        resource_id: i64,
        complex_resource_id: i64,
    ) -> Result<FineSchedule, EmiasError> {
        self.call(
            EmiasMethod::FineSchedule,
            FineScheduleParams {
                oms_number: oms_number.to_string(),
                birth_date: format_birth_date(birth_date),
                available_resource_id: resource_id.to_string(),
                complex_resource_id: complex_resource_id.to_string(),
            },
        )
        .await
    }

    /// Bookable slots of one doctor's complex resource, in upstream order.
    #[instrument(skip(self, oms_number, birth_date))]
    pub async fn lookup_fine_schedule(
        &self,
        oms_number: &str,
        birth_date: NaiveDate,
        resource_id: i64,
        complex_resource_id: i64,
    ) -> Result<Vec<UpstreamSlot>, EmiasError> {
        let schedule = self
            .fetch_fine_schedule(oms_number, birth_date, resource_id, complex_resource_id)
            .await?;

        extract_upstream_slots(&schedule, complex_resource_id)
    }

    pub fn schedule_cache_stats(&self) -> CacheStats {
        self.schedule_cache.stats()
    }
}
