use std::collections::HashMap;
use std::sync::Arc;

use drift_domain::DriftRecord;
use tokio::sync::RwLock;

/// Drift records retained per analysis job. Retention parallels the Job
/// Registry: when `JobRegistry::cleanup` prunes a terminal job, the drift
/// records it produced are pruned alongside it here. No durable persistence
/// backs this store; only the resource cache snapshot is durable.
#[derive(Clone, Default)]
pub struct DriftStore {
    inner: Arc<RwLock<HashMap<String, Vec<DriftRecord>>>>,
}

impl DriftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job_id: impl Into<String>, records: Vec<DriftRecord>) {
        self.inner.write().await.insert(job_id.into(), records);
    }

    pub async fn get(&self, job_id: &str) -> Option<Vec<DriftRecord>> {
        self.inner.read().await.get(job_id).cloned()
    }

    /// Flattened view over every retained job's records.
    pub async fn list_all(&self) -> Vec<DriftRecord> {
        self.inner.read().await.values().flatten().cloned().collect()
    }

    /// Drop records for jobs no longer tracked by the Job Registry.
    pub async fn prune(&self, pruned_job_ids: &[String]) {
        if pruned_job_ids.is_empty() {
            return;
        }
        let mut guard = self.inner.write().await;
        for id in pruned_job_ids {
            guard.remove(id);
        }
    }
}
