use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::Provider;

/// Lifecycle state of a background discovery job.
///
/// Transitions: `pending -> running -> {completed, failed, cancelled}`.
/// `failed`/`cancelled` may interrupt `running` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// A background discovery unit of work, owned exclusively by the Discovery Hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub provider: Provider,
    pub regions: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub progress: u8,
    pub message: String,
    pub error: Option<String>,
    pub resource_count: usize,
    pub metadata: HashMap<String, String>,
}

impl Job {
    pub fn new(id: String, provider: Provider, regions: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: JobStatus::Running,
            provider,
            regions,
            start_time: now,
            end_time: None,
            progress: 0,
            message: String::new(),
            error: None,
            resource_count: 0,
            metadata: HashMap::new(),
        }
    }

    /// Build an already-completed pseudo-job for the cache-hit fast path.
    pub fn cache_hit(
        id: String,
        provider: Provider,
        regions: Vec<String>,
        now: DateTime<Utc>,
        resource_count: usize,
        age_seconds: i64,
    ) -> Self {
        Self {
            id,
            status: JobStatus::Completed,
            provider,
            regions,
            start_time: now,
            end_time: Some(now),
            progress: 100,
            message: format!("Using cached data (age: {}s)", age_seconds),
            error: None,
            resource_count,
            metadata: HashMap::new(),
        }
    }

    pub fn set_progress(&mut self, progress: u8, message: impl Into<String>) {
        self.progress = progress.min(100);
        self.message = message.into();
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>, resource_count: usize) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.end_time = Some(now);
        self.resource_count = resource_count;
    }

    pub fn mark_failed(&mut self, now: DateTime<Utc>, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.end_time = Some(now);
        let error = error.into();
        self.message = error.clone();
        self.error = Some(error);
    }

    pub fn mark_cancelled(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Cancelled;
        self.end_time = Some(now);
        self.error = Some("cancelled".to_string());
        self.message = "cancelled".to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_job_has_full_progress_and_end_time() {
        let mut job = Job::new("j1".into(), Provider::Aws, vec!["us-east-1".into()], Utc::now());
        job.mark_completed(Utc::now(), 4);
        assert_eq!(job.progress, 100);
        assert!(job.end_time.is_some());
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn failed_job_is_terminal_with_error() {
        let mut job = Job::new("j1".into(), Provider::Aws, vec![], Utc::now());
        job.mark_failed(Utc::now(), "boom");
        assert!(job.status.is_terminal());
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[test]
    fn cache_hit_job_is_completed_immediately() {
        let job = Job::cache_hit("j2".into(), Provider::Aws, vec!["us-east-1".into()], Utc::now(), 42, 30);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.resource_count, 42);
        assert!(job.message.contains("Using cached data"));
    }
}
