use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use drift_domain::{Provider as ProviderKind, Resource};
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{ConnectionStatus, DiscoverOptions, DiscoverSummary, Provider};

#[derive(Debug, Clone)]
pub struct DigitalOceanConfig {
    pub api_token: String,
    pub base_url: String,
}

impl DigitalOceanConfig {
    /// Reads `DIGITALOCEAN_TOKEN` from the process environment. No prompting.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_token = std::env::var("DIGITALOCEAN_TOKEN")
            .map_err(|_| ProviderError::CredentialError("DIGITALOCEAN_TOKEN not set".into()))?;
        Ok(Self {
            api_token,
            base_url: "https://api.digitalocean.com".to_string(),
        })
    }
}

pub struct DigitalOceanProvider {
    config: DigitalOceanConfig,
    client: reqwest::Client,
}

impl DigitalOceanProvider {
    pub fn new(config: DigitalOceanConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ProviderError> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Throttled("digitalocean rate limit".into()));
        }
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::CredentialError("digitalocean token rejected".into()));
        }
        if !resp.status().is_success() {
            return Err(ProviderError::NetworkError(format!("digitalocean returned {}", resp.status())));
        }

        resp.json::<T>().await.map_err(|e| ProviderError::NetworkError(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct DropletsResponse {
    droplets: Vec<Droplet>,
}

#[derive(Debug, Deserialize)]
struct Droplet {
    id: u64,
    name: String,
    status: String,
    region: DropletRegion,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DropletRegion {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct RegionsResponse {
    regions: Vec<RegionEntry>,
}

#[derive(Debug, Deserialize)]
struct RegionEntry {
    slug: String,
    available: bool,
}

#[async_trait]
impl Provider for DigitalOceanProvider {
    fn name(&self) -> &'static str {
        "digitalocean"
    }

    async fn discover(
        &self,
        region: &str,
        _options: &DiscoverOptions,
    ) -> Result<(Vec<Resource>, DiscoverSummary), ProviderError> {
        debug!(region, "DigitalOceanProvider: discover");
        let start = Instant::now();
        let response: DropletsResponse = self.get_json("/v2/droplets").await?;

        let resources: Vec<Resource> = response
            .droplets
            .into_iter()
            .filter(|d| d.region.slug == region)
            .map(|d| {
                // DO tags come back as a flat string array; flatten into the
                // canonical map shape with an empty value per key.
                let tags: HashMap<String, String> = d.tags.into_iter().map(|t| (t, String::new())).collect();
                Resource {
                    id: d.id.to_string(),
                    name: d.name,
                    resource_type: "droplet".to_string(),
                    provider: ProviderKind::DigitalOcean,
                    region: d.region.slug,
                    account: None,
                    status: d.status,
                    tags,
                    properties: HashMap::new(),
                    dependencies: vec![],
                    modified_at: None,
                    last_scanned: None,
                }
            })
            .collect();

        let summary = DiscoverSummary {
            region: region.to_string(),
            resource_count: resources.len(),
            errors: vec![],
            duration: start.elapsed(),
        };
        Ok((resources, summary))
    }

    async fn list_regions(&self) -> Result<Vec<String>, ProviderError> {
        let response: RegionsResponse = self.get_json("/v2/regions").await?;
        Ok(response
            .regions
            .into_iter()
            .filter(|r| r.available)
            .map(|r| r.slug)
            .collect())
    }

    async fn test_connection(&self, _region: &str) -> Result<ConnectionStatus, ProviderError> {
        let start = Instant::now();
        let result: Result<serde_json::Value, ProviderError> = self.get_json("/v2/account").await;
        let latency = start.elapsed();
        match result {
            Ok(_) => Ok(ConnectionStatus {
                ok: true,
                latency,
                message: "account reachable".to_string(),
            }),
            Err(e) => Ok(ConnectionStatus {
                ok: false,
                latency,
                message: e.to_string(),
            }),
        }
    }
}
