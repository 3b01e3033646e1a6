use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse age bucket surfaced to API consumers alongside raw ages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Fresh,
    Recent,
    Stale,
}

impl Freshness {
    /// < 5 minutes is fresh, < 30 minutes is recent, otherwise stale.
    pub fn from_age_seconds(age_seconds: i64) -> Self {
        if age_seconds < 5 * 60 {
            Freshness::Fresh
        } else if age_seconds < 30 * 60 {
            Freshness::Recent
        } else {
            Freshness::Stale
        }
    }
}

/// Describes a cache snapshot as a whole: how it was built and how many
/// entries it holds, independent of any single entry's TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub version: u64,
    pub last_updated: DateTime<Utc>,
    pub resource_count: usize,
    #[serde(default)]
    pub sources: Vec<String>,
    pub ttl_seconds: i64,
}

impl CacheMetadata {
    pub fn new(version: u64, resource_count: usize, sources: Vec<String>, ttl_seconds: i64, now: DateTime<Utc>) -> Self {
        Self {
            version,
            last_updated: now,
            resource_count,
            sources,
            ttl_seconds,
        }
    }

    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        let age = (now - self.last_updated).num_seconds().max(0);
        Freshness::from_age_seconds(age)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = (now - self.last_updated).num_seconds();
        age >= self.ttl_seconds
    }
}
