use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use uuid::Uuid;

use crate::config::JobsConfig;
use crate::models::{JobStatus, PartNumber, SearchJob, Vendor, VendorResult};
use crate::orchestrator::{ProgressReporter, SearchOrchestrator};
use crate::telemetry::metric_names;
use crate::utils::error::{AppError, Result};

const ID_ATTEMPTS: usize = 3;

/// Concurrency-safe map of job id to job. Readers always get a copy.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, SearchJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a job under a fresh id; fails if the id is already taken.
    pub async fn insert_new(&self, job: SearchJob) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(AppError::Internal(format!("Duplicate search id: {}", job.id)));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    pub async fn snapshot(&self, id: &str) -> Option<SearchJob> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Applies `f` to a running job. Finished jobs are left untouched.
    pub async fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut SearchJob),
    {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(job) if !job.is_finished() => {
                f(job);
                true
            }
            _ => false,
        }
    }

    /// Drops finished jobs that ended before `cutoff`.
    pub async fn remove_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.is_finished() || job.end_time.is_none_or(|end| end >= cutoff));
        before - jobs.len()
    }

    pub async fn counts(&self) -> (usize, usize, usize) {
        let jobs = self.jobs.read().await;
        jobs.values().fold((0, 0, 0), |(running, completed, failed), job| match job.status {
            JobStatus::Running => (running + 1, completed, failed),
            JobStatus::Completed => (running, completed + 1, failed),
            JobStatus::Error => (running, completed, failed + 1),
        })
    }

    #[cfg(test)]
    async fn force(&self, job: SearchJob) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }
}

/// The orchestrator's view of one job: progress lands in the store.
struct JobHandle {
    id: String,
    store: JobStore,
}

#[async_trait]
impl ProgressReporter for JobHandle {
    async fn vendor_started(&self, vendor: Vendor, index: usize, total: usize) {
        self.store
            .update(&self.id, |job| {
                job.current_step = format!("Searching {}...", vendor.display_name());
                job.progress = progress_percent(index, total);
            })
            .await;
    }

    async fn vendor_finished(&self, result: &VendorResult, completed: usize, total: usize) {
        let result = result.clone();
        self.store
            .update(&self.id, move |job| {
                job.results.push(result);
                job.progress = progress_percent(completed, total);
            })
            .await;
    }
}

fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (done.min(total) * 100 / total) as u8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerStats {
    pub total_jobs: usize,
    pub running_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub uptime_seconds: u64,
}

/// Accepts searches, runs each on the worker pool and answers status polls.
pub struct SearchJobTracker {
    store: JobStore,
    orchestrator: SearchOrchestrator,
    workers: Arc<Semaphore>,
    config: JobsConfig,
    start_time: DateTime<Utc>,
}

impl SearchJobTracker {
    pub fn new(orchestrator: SearchOrchestrator, config: JobsConfig) -> Self {
        Self {
            store: JobStore::new(),
            orchestrator,
            workers: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
            config,
            start_time: Utc::now(),
        }
    }

    /// Validates the request, registers a running job and schedules it.
    /// Returns the job id without waiting for the search.
    pub async fn submit(&self, part_number: &str, websites: &[String]) -> Result<String> {
        let part_number = PartNumber::new(part_number)?;
        if websites.is_empty() {
            return Err(AppError::Validation("At least one website must be selected".to_string()));
        }
        let vendors = Vendor::parse_selection(websites)?;

        let id = self.register(&part_number, &vendors).await?;
        metrics::counter!(metric_names::SEARCHES_SUBMITTED).increment(1);
        tracing::info!(search_id = %id, part_number = %part_number, ?vendors, "Search submitted");

        let store = self.store.clone();
        let orchestrator = self.orchestrator.clone();
        let workers = Arc::clone(&self.workers);
        let job_id = id.clone();

        tokio::spawn(async move {
            let _permit = match workers.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    store.update(&job_id, |job| job.fail(format!("Worker pool closed: {}", e))).await;
                    return;
                }
            };

            let reporter = JobHandle {
                id: job_id.clone(),
                store: store.clone(),
            };
            let run = tokio::spawn(async move { orchestrator.run(&part_number, &vendors, &reporter).await });

            match run.await {
                Ok(Ok(results)) => {
                    store
                        .update(&job_id, |job| {
                            job.results = results;
                            job.complete();
                        })
                        .await;
                    tracing::info!(search_id = %job_id, "Search completed");
                }
                Ok(Err(e)) => {
                    tracing::error!(search_id = %job_id, "Search failed: {}", e);
                    store.update(&job_id, |job| job.fail(e.to_string())).await;
                }
                Err(e) => {
                    let error = AppError::from(e);
                    tracing::error!(search_id = %job_id, "Search aborted: {}", error);
                    store.update(&job_id, |job| job.fail(error.to_string())).await;
                }
            }
        });

        Ok(id)
    }

    pub async fn get_status(&self, id: &str) -> Result<SearchJob> {
        self.store
            .snapshot(id)
            .await
            .ok_or_else(|| AppError::JobNotFound { id: id.to_string() })
    }

    pub async fn stats(&self) -> TrackerStats {
        let (running_jobs, completed_jobs, failed_jobs) = self.store.counts().await;
        TrackerStats {
            total_jobs: running_jobs + completed_jobs + failed_jobs,
            running_jobs,
            completed_jobs,
            failed_jobs,
            uptime_seconds: (Utc::now() - self.start_time).num_seconds().max(0) as u64,
        }
    }

    /// Removes finished jobs older than the retention period, if one is set.
    pub async fn evict_expired(&self) -> usize {
        let Some(retention) = self.config.retention_secs else {
            return 0;
        };
        let cutoff = i64::try_from(retention)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|age| Utc::now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            tracing::warn!("Retention of {}s is out of range, skipping eviction", retention);
            return 0;
        };
        let removed = self.store.remove_finished_before(cutoff).await;
        if removed > 0 {
            tracing::debug!("Evicted {} finished searches", removed);
        }
        removed
    }

    /// Starts the periodic eviction task when a retention period is configured.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        self.config.retention_secs?;
        let tracker = Arc::clone(self);
        let period = Duration::from_secs(self.config.sweep_interval_secs.max(1));

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                tracker.evict_expired().await;
            }
        }))
    }

    async fn register(&self, part_number: &PartNumber, vendors: &[Vendor]) -> Result<String> {
        let mut last_error = None;
        for _ in 0..ID_ATTEMPTS {
            let job = SearchJob::new(new_job_id(), part_number, vendors.to_vec());
            let id = job.id.clone();
            match self.store.insert_new(job).await {
                Ok(()) => return Ok(id),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| AppError::Internal("Could not allocate a search id".to_string())))
    }
}

/// `search_<unix millis>_<8 hex>`
fn new_job_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("search_{}_{}", Utc::now().timestamp_millis(), &suffix[..8])
}
