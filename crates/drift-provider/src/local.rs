use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use drift_domain::{Provider as ProviderKind, Resource};
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{ConnectionStatus, DiscoverOptions, DiscoverSummary, Provider};

/// A stub adapter that synthesizes resources locally, with no network I/O.
/// Used by tests and the CLI's `--cloud local` mode so the rest of the
/// system is exercisable without live credentials.
#[derive(Debug, Default, Clone)]
pub struct LocalProvider {
    seed_count: usize,
}

impl LocalProvider {
    pub fn new(seed_count: usize) -> Self {
        Self { seed_count }
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn discover(
        &self,
        region: &str,
        _options: &DiscoverOptions,
    ) -> Result<(Vec<Resource>, DiscoverSummary), ProviderError> {
        debug!(region, "LocalProvider: discover");
        let start = Instant::now();
        let resources: Vec<Resource> = (0..self.seed_count)
            .map(|i| Resource {
                id: format!("local-{}", i),
                name: format!("local-resource-{}", i),
                resource_type: "local_stub".to_string(),
                provider: ProviderKind::Local,
                region: region.to_string(),
                account: None,
                status: "active".to_string(),
                tags: HashMap::new(),
                properties: HashMap::new(),
                dependencies: vec![],
                modified_at: None,
                last_scanned: None,
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
        Ok(vec!["local".to_string()])
    }

    async fn test_connection(&self, _region: &str) -> Result<ConnectionStatus, ProviderError> {
        Ok(ConnectionStatus {
            ok: true,
            latency: Duration::from_millis(0),
            message: "local provider always reachable".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn discover_produces_seeded_count() {
        let provider = LocalProvider::new(3);
        let (resources, summary) = provider.discover("local", &DiscoverOptions::default()).await.unwrap();
        assert_eq!(resources.len(), 3);
        assert_eq!(summary.resource_count, 3);
    }

    #[tokio::test]
    async fn test_connection_always_succeeds() {
        let provider = LocalProvider::new(0);
        let status = provider.test_connection("local").await.unwrap();
        assert!(status.ok);
    }
}
