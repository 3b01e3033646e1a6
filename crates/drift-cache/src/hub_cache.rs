use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use drift_domain::{CacheMetadata, Freshness, Resource};
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::snapshot::{default_snapshot_path, load_snapshot, write_snapshot, Snapshot};

struct Inner {
    resources: HashMap<String, Resource>,
    order: Vec<String>,
    version: u64,
    last_updated: DateTime<Utc>,
}

/// Deduplicating, ordered view over [`Resource`], keyed by `Resource.id`.
/// Owns the on-disk snapshot: every mutation persists the full slice.
#[derive(Clone)]
pub struct HubCache {
    inner: Arc<RwLock<Inner>>,
    snapshot_path: PathBuf,
    ttl_seconds: i64,
}

impl HubCache {
    pub fn new(snapshot_path: PathBuf, ttl_seconds: i64, now: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                resources: HashMap::new(),
                order: Vec::new(),
                version: 0,
                last_updated: now,
            })),
            snapshot_path,
            ttl_seconds,
        }
    }

    pub fn with_default_path(ttl_seconds: i64, now: DateTime<Utc>) -> Self {
        Self::new(default_snapshot_path(), ttl_seconds, now)
    }

    /// Load the on-disk snapshot if present and no older than 24h,
    /// deduplicating by `id`. Absence or staleness is not an error.
    pub async fn load_from_disk(&self, now: DateTime<Utc>) {
        let Some(snapshot) = load_snapshot(&self.snapshot_path, chrono::Duration::hours(24), now).await else {
            return;
        };
        let mut guard = self.inner.write().await;
        for resource in snapshot.resources {
            if !guard.resources.contains_key(&resource.id) {
                guard.order.push(resource.id.clone());
            }
            guard.resources.insert(resource.id.clone(), resource);
        }
        guard.last_updated = snapshot.timestamp;
    }

    /// Insert-or-replace each resource, bump the version once, and persist.
    pub async fn merge(&self, resources: Vec<Resource>, now: DateTime<Utc>) -> Result<(), CacheError> {
        let snapshot = {
            let mut guard = self.inner.write().await;
            for resource in resources {
                if !guard.resources.contains_key(&resource.id) {
                    guard.order.push(resource.id.clone());
                }
                guard.resources.insert(resource.id.clone(), resource);
            }
            guard.version += 1;
            guard.last_updated = now;
            Snapshot {
                resources: guard.order.iter().filter_map(|id| guard.resources.get(id).cloned()).collect(),
                timestamp: now,
            }
        };
        write_snapshot(&self.snapshot_path, &snapshot).await
    }

    /// Defensive copy of the current resource slice, in stable insertion order.
    pub async fn list(&self) -> Vec<Resource> {
        let guard = self.inner.read().await;
        guard.order.iter().filter_map(|id| guard.resources.get(id).cloned()).collect()
    }

    pub async fn get(&self, id: &str) -> Option<Resource> {
        self.inner.read().await.resources.get(id).cloned()
    }

    pub async fn invalidate(&self, id: &str) -> bool {
        let mut guard = self.inner.write().await;
        if guard.resources.remove(id).is_some() {
            guard.order.retain(|existing| existing != id);
            guard.version += 1;
            true
        } else {
            false
        }
    }

    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut guard = self.inner.write().await;
        let to_remove: Vec<String> = guard
            .resources
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();
        for id in &to_remove {
            guard.resources.remove(id);
        }
        guard.order.retain(|id| !to_remove.contains(id));
        if !to_remove.is_empty() {
            guard.version += 1;
        }
        to_remove.len()
    }

    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.resources.clear();
        guard.order.clear();
        guard.version += 1;
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.resources.len()
    }

    pub async fn version(&self) -> u64 {
        self.inner.read().await.version
    }

    pub async fn metadata(&self, sources: Vec<String>) -> CacheMetadata {
        let guard = self.inner.read().await;
        CacheMetadata::new(guard.version, guard.resources.len(), sources, self.ttl_seconds, guard.last_updated)
    }

    pub async fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        let guard = self.inner.read().await;
        let age = (now - guard.last_updated).num_seconds().max(0);
        Freshness::from_age_seconds(age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_domain::Provider;
    use std::collections::HashMap as Map;

    fn resource(id: &str) -> Resource {
        Resource {
            id: id.to_string(),
            name: id.to_string(),
            resource_type: "aws_instance".into(),
            provider: Provider::Aws,
            region: "us-east-1".into(),
            account: None,
            status: "running".into(),
            tags: Map::new(),
            properties: Map::new(),
            dependencies: vec![],
            modified_at: None,
            last_scanned: None,
        }
    }

    #[tokio::test]
    async fn merge_dedups_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HubCache::new(dir.path().join("snap.json"), 300, Utc::now());
        cache.merge(vec![resource("i-1")], Utc::now()).await.unwrap();
        cache.merge(vec![resource("i-1"), resource("i-2")], Utc::now()).await.unwrap();
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.version().await, 2);
    }

    #[tokio::test]
    async fn metadata_version_tracks_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HubCache::new(dir.path().join("snap.json"), 300, Utc::now());
        assert_eq!(cache.metadata(vec![]).await.version, 0);
        cache.merge(vec![resource("i-1")], Utc::now()).await.unwrap();
        assert_eq!(cache.metadata(vec![]).await.version, 1);
        cache.invalidate("i-1").await;
        assert_eq!(cache.metadata(vec![]).await.version, 2);
    }

    #[tokio::test]
    async fn invalidate_removes_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HubCache::new(dir.path().join("snap.json"), 300, Utc::now());
        cache.merge(vec![resource("i-1"), resource("i-2")], Utc::now()).await.unwrap();
        assert!(cache.invalidate("i-1").await);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("i-1").await.is_none());
    }

    #[tokio::test]
    async fn invalidate_prefix_removes_matching() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HubCache::new(dir.path().join("snap.json"), 300, Utc::now());
        cache
            .merge(vec![resource("aws:a:1"), resource("aws:a:2"), resource("gcp:b:1")], Utc::now())
            .await
            .unwrap();
        let removed = cache.invalidate_prefix("aws:").await;
        assert_eq!(removed, 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn merge_persists_snapshot_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let cache = HubCache::new(path.clone(), 300, Utc::now());
        cache.merge(vec![resource("i-1")], Utc::now()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn load_from_disk_deduplicates_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let now = Utc::now();
        crate::snapshot::write_snapshot(
            &path,
            &Snapshot {
                resources: vec![resource("i-1"), resource("i-1")],
                timestamp: now,
            },
        )
        .await
        .unwrap();

        let cache = HubCache::new(path, 300, now);
        cache.load_from_disk(now).await;
        assert_eq!(cache.len().await, 1);
    }
}
