use std::time::Duration;

use async_trait::async_trait;
use drift_domain::Resource;

use crate::error::ProviderError;

#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    /// Restrict discovery to these resource types; empty means all known types.
    pub resource_types: Vec<String>,
    pub parallel: bool,
    pub max_workers: usize,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoverSummary {
    pub region: String,
    pub resource_count: usize,
    pub errors: Vec<String>,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub ok: bool,
    pub latency: Duration,
    pub message: String,
}

/// A cloud provider adapter: read-only discovery, region enumeration, and a
/// connectivity probe. Implementations never mutate cloud state.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Idempotent, read-only. Must not produce duplicate resources within a
    /// single call. Partial results on partial failure are returned via
    /// `ProviderError::PartialFailure`, not silently dropped.
    async fn discover(
        &self,
        region: &str,
        options: &DiscoverOptions,
    ) -> Result<(Vec<Resource>, DiscoverSummary), ProviderError>;

    /// Regions this adapter currently has credentials for.
    async fn list_regions(&self) -> Result<Vec<String>, ProviderError>;

    /// Bounded-latency connectivity probe; never mutates state.
    async fn test_connection(&self, region: &str) -> Result<ConnectionStatus, ProviderError>;
}
