use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use drift_domain::Job;
use tokio::sync::RwLock;

use crate::error::HubError;

/// In-process `job_id -> Job` map. Read-heavy, write-bursty: a single
/// `RwLock` protects the whole map, but every mutation only ever touches
/// one job's fields, mirroring `InMemoryStore`'s per-collection locking.
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.inner.write().await.insert(job.id.clone(), job);
    }

    pub async fn get(&self, id: &str) -> Option<Job> {
        self.inner.read().await.get(id).cloned()
    }

    /// Snapshot copy, newest first.
    pub async fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.inner.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        jobs
    }

    pub async fn set_progress(&self, id: &str, progress: u8, message: impl Into<String>) -> Result<(), HubError> {
        let mut guard = self.inner.write().await;
        let job = guard.get_mut(id).ok_or_else(|| HubError::JobNotFound(id.to_string()))?;
        job.set_progress(progress, message);
        Ok(())
    }

    pub async fn complete(&self, id: &str, now: DateTime<Utc>, resource_count: usize) -> Result<(), HubError> {
        let mut guard = self.inner.write().await;
        let job = guard.get_mut(id).ok_or_else(|| HubError::JobNotFound(id.to_string()))?;
        job.mark_completed(now, resource_count);
        Ok(())
    }

    pub async fn fail(&self, id: &str, now: DateTime<Utc>, error: impl Into<String>) -> Result<(), HubError> {
        let mut guard = self.inner.write().await;
        let job = guard.get_mut(id).ok_or_else(|| HubError::JobNotFound(id.to_string()))?;
        job.mark_failed(now, error);
        Ok(())
    }

    /// Cooperative cancellation: flips the job to `cancelled` so the worker's
    /// own status poll can observe it. Errors if the job already finished.
    pub async fn cancel(&self, id: &str, now: DateTime<Utc>) -> Result<(), HubError> {
        let mut guard = self.inner.write().await;
        let job = guard.get_mut(id).ok_or_else(|| HubError::JobNotFound(id.to_string()))?;
        if job.status.is_terminal() {
            return Err(HubError::AlreadyTerminal(id.to_string()));
        }
        job.mark_cancelled(now);
        Ok(())
    }

    /// Prune terminal jobs whose `end_time` is older than `max_age`. Returns
    /// the ids removed, so callers can cascade the prune to other
    /// job-keyed state (e.g. retained drift records).
    pub async fn cleanup(&self, max_age: chrono::Duration, now: DateTime<Utc>) -> Vec<String> {
        let mut guard = self.inner.write().await;
        let expired: Vec<String> = guard
            .iter()
            .filter(|(_, job)| job.status.is_terminal() && job.end_time.map(|t| now - t >= max_age).unwrap_or(false))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            guard.remove(id);
        }
        expired
    }
}
