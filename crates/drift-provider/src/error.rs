use thiserror::Error;

use drift_domain::Resource;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("credential error: {0}")]
    CredentialError(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("throttled by provider: {0}")]
    Throttled(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Non-fatal: some resources were discovered, some regions/calls failed.
    /// Callers must accept the partial list rather than discarding it.
    #[error("partial discovery failure: {} resources, {} errors", .results.len(), .errors.len())]
    PartialFailure {
        results: Vec<Resource>,
        errors: Vec<String>,
    },

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}
