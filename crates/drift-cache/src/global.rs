use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

struct Entry {
    value: Value,
    stored_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    version: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, EntrySlot>,
}

struct EntrySlot(Entry);

impl std::fmt::Debug for EntrySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntrySlot")
            .field("stored_at", &self.0.stored_at)
            .field("expires_at", &self.0.expires_at)
            .field("version", &self.0.version)
            .finish()
    }
}

/// Keyed, TTL-bounded value store. Eviction is lazy on access, backed by a
/// periodic sweep task for entries nobody reads again.
#[derive(Debug, Clone, Default)]
pub struct GlobalCache {
    inner: Arc<RwLock<Inner>>,
}

pub struct GetResult {
    pub value: Value,
    pub age_seconds: i64,
}

impl GlobalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: impl Into<String>, value: Value, ttl: StdDuration, now: DateTime<Utc>) {
        let mut guard = self.inner.write().await;
        let key = key.into();
        let version = guard
            .entries
            .get(&key)
            .map(|s| s.0.version + 1)
            .unwrap_or(1);
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(0));
        guard.entries.insert(
            key,
            EntrySlot(Entry {
                value,
                stored_at: now,
                expires_at: now + ttl,
                version,
            }),
        );
    }

    pub async fn get(&self, key: &str, now: DateTime<Utc>) -> Option<Value> {
        self.get_with_age(key, now).await.map(|r| r.value)
    }

    pub async fn get_with_age(&self, key: &str, now: DateTime<Utc>) -> Option<GetResult> {
        let guard = self.inner.read().await;
        let slot = guard.entries.get(key)?;
        if slot.0.expires_at <= now {
            return None;
        }
        let age_seconds = (now - slot.0.stored_at).num_seconds().max(0);
        Some(GetResult {
            value: slot.0.value.clone(),
            age_seconds,
        })
    }

    pub async fn invalidate(&self, key: &str) {
        let mut guard = self.inner.write().await;
        guard.entries.remove(key);
    }

    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Keys for entries not yet expired as of `now`, sorted for stable output.
    pub async fn keys(&self, now: DateTime<Utc>) -> Vec<String> {
        let guard = self.inner.read().await;
        let mut keys: Vec<String> = guard
            .entries
            .iter()
            .filter(|(_, slot)| slot.0.expires_at > now)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop all entries whose TTL has already elapsed as of `now`. Intended
    /// to be driven by a background interval task; `get`/`get_with_age`
    /// already hide expired entries from readers regardless of whether this
    /// has run.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut guard = self.inner.write().await;
        let before = guard.entries.len();
        guard.entries.retain(|_, slot| slot.0.expires_at > now);
        before - guard.entries.len()
    }

    /// Spawn a background task that sweeps expired entries every `interval`.
    /// Runs until the returned handle is dropped or aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: StdDuration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = cache.sweep_expired(Utc::now()).await;
                if removed > 0 {
                    tracing::debug!(removed, "global cache sweep evicted expired entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_hits() {
        let cache = GlobalCache::new();
        let now = Utc::now();
        cache.set("k", json!({"a": 1}), StdDuration::from_secs(60), now).await;
        let got = cache.get("k", now).await;
        assert_eq!(got, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = GlobalCache::new();
        let now = Utc::now();
        cache.set("k", json!(1), StdDuration::from_secs(5), now).await;
        let later = now + Duration::seconds(10);
        assert!(cache.get("k", later).await.is_none());
    }

    #[tokio::test]
    async fn get_with_age_reports_elapsed_seconds() {
        let cache = GlobalCache::new();
        let now = Utc::now();
        cache.set("k", json!(1), StdDuration::from_secs(120), now).await;
        let later = now + Duration::seconds(30);
        let result = cache.get_with_age("k", later).await.unwrap();
        assert_eq!(result.age_seconds, 30);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let cache = GlobalCache::new();
        let now = Utc::now();
        cache.set("fresh", json!(1), StdDuration::from_secs(300), now).await;
        cache.set("stale", json!(1), StdDuration::from_secs(1), now).await;
        let later = now + Duration::seconds(10);
        let removed = cache.sweep_expired(later).await;
        assert_eq!(removed, 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn keys_excludes_expired_entries() {
        let cache = GlobalCache::new();
        let now = Utc::now();
        cache.set("fresh", json!(1), StdDuration::from_secs(300), now).await;
        cache.set("stale", json!(1), StdDuration::from_secs(1), now).await;
        let later = now + Duration::seconds(10);
        assert_eq!(cache.keys(later).await, vec!["fresh".to_string()]);
    }

    #[tokio::test]
    async fn invalidate_and_clear() {
        let cache = GlobalCache::new();
        let now = Utc::now();
        cache.set("k1", json!(1), StdDuration::from_secs(60), now).await;
        cache.set("k2", json!(2), StdDuration::from_secs(60), now).await;
        cache.invalidate("k1").await;
        assert_eq!(cache.len().await, 1);
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
