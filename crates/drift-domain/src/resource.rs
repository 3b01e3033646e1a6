use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

/// The cloud a resource or discovery request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
    #[serde(rename = "digitalocean")]
    DigitalOcean,
    /// Stub provider used in tests and the CLI's offline mode.
    Local,
}

impl Provider {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "azure" => Ok(Provider::Azure),
            "gcp" => Ok(Provider::Gcp),
            "digitalocean" | "do" => Ok(Provider::DigitalOcean),
            "local" => Ok(Provider::Local),
            other => Err(DomainError::InvalidProvider(other.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
            Provider::DigitalOcean => "digitalocean",
            Provider::Local => "local",
        };
        write!(f, "{}", s)
    }
}

/// Canonical live-or-declared resource record. Every subsystem downstream of
/// discovery and state parsing speaks this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Provider-stable identifier. Unique within `(provider, type)`.
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub provider: Provider,
    pub region: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_scanned: Option<DateTime<Utc>>,
}

impl Resource {
    /// The canonical cache key: `provider:type:id`. Authoritative form per
    /// the data model invariant; Hub-level dedup uses `id` alone as a
    /// narrower, legacy-compatible behavior (see DESIGN.md).
    pub fn cache_key(&self) -> String {
        format!("{}:{}:{}", self.provider, self.resource_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Resource {
        Resource {
            id: "i-123".into(),
            name: "web-1".into(),
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

    #[test]
    fn cache_key_is_provider_type_id() {
        let r = sample();
        assert_eq!(r.cache_key(), "aws:aws_instance:i-123");
    }

    #[test]
    fn resource_round_trips_through_json() {
        let r = sample();
        let json = serde_json::to_string(&r).unwrap();
        let back: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }

    #[test]
    fn resource_tolerates_unknown_fields() {
        let json = r#"{
            "id": "i-1", "name": "n", "type": "aws_instance",
            "provider": "aws", "region": "us-east-1",
            "some_future_field": 42
        }"#;
        let r: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(r.id, "i-1");
        assert!(r.tags.is_empty());
    }

    #[test]
    fn provider_parse_is_case_insensitive() {
        assert_eq!(Provider::parse("AWS").unwrap(), Provider::Aws);
        assert_eq!(Provider::parse("DigitalOcean").unwrap(), Provider::DigitalOcean);
    }

    #[test]
    fn provider_parse_rejects_unknown() {
        assert!(Provider::parse("oracle").is_err());
    }
}
