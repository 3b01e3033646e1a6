use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use drift_domain::Resource;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub resources: Vec<Resource>,
    pub timestamp: DateTime<Utc>,
}

/// `<user-home>/.driftmgr/resource_cache.json`, falling back to the OS temp
/// dir when the home directory cannot be resolved. Overridable via
/// `DRIFTMGR_CACHE_PATH`.
pub fn default_snapshot_path() -> PathBuf {
    if let Ok(path) = std::env::var("DRIFTMGR_CACHE_PATH") {
        return PathBuf::from(path);
    }
    let base = dirs_home().unwrap_or_else(std::env::temp_dir);
    base.join(".driftmgr").join("resource_cache.json")
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Write the snapshot atomically: write to a sibling temp file, then rename
/// over the destination so a crash mid-write never leaves a torn file.
pub async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_vec_pretty(snapshot)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &body).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Load the snapshot if present and no older than `max_age`. Absence or a
/// stale snapshot is not an error — both simply return `None`, the same as
/// a read failure, so startup never blocks on cache history.
pub async fn load_snapshot(path: &Path, max_age: chrono::Duration, now: DateTime<Utc>) -> Option<Snapshot> {
    let body = tokio::fs::read(path).await.ok()?;
    let snapshot: Snapshot = serde_json::from_slice(&body).ok()?;
    if now - snapshot.timestamp > max_age {
        tracing::debug!(path = %path.display(), "ignoring snapshot older than max age");
        return None;
    }
    Some(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_domain::Provider;
    use std::collections::HashMap;

    fn resource(id: &str) -> Resource {
        Resource {
            id: id.to_string(),
            name: id.to_string(),
            resource_type: "aws_instance".into(),
            provider: Provider::Aws,
            region: "us-east-1".into(),
            account: None,
            status: "running".into(),
            tags: HashMap::new(),
            properties: HashMap::new(),
            dependencies: vec![],
            modified_at: None,
            last_scanned: None,
        }
    }

    #[tokio::test]
    async fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resource_cache.json");
        let now = Utc::now();
        let snap = Snapshot {
            resources: vec![resource("i-1")],
            timestamp: now,
        };
        write_snapshot(&path, &snap).await.unwrap();

        let loaded = load_snapshot(&path, chrono::Duration::hours(24), now).await;
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().resources.len(), 1);
    }

    #[tokio::test]
    async fn missing_snapshot_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let loaded = load_snapshot(&path, chrono::Duration::hours(24), Utc::now()).await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn snapshot_older_than_max_age_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resource_cache.json");
        let old = Utc::now() - chrono::Duration::hours(25);
        let snap = Snapshot {
            resources: vec![resource("i-1")],
            timestamp: old,
        };
        write_snapshot(&path, &snap).await.unwrap();

        let loaded = load_snapshot(&path, chrono::Duration::hours(24), Utc::now()).await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn no_temp_file_left_behind_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resource_cache.json");
        let snap = Snapshot {
            resources: vec![],
            timestamp: Utc::now(),
        };
        write_snapshot(&path, &snap).await.unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.exists());
    }
}
