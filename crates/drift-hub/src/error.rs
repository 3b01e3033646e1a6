use thiserror::Error;

use drift_cache::CacheError;
use drift_engine::EngineError;
use drift_provider::ProviderError;

#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("job {0} is already in a terminal state")]
    AlreadyTerminal(String),

    #[error("discovery timed out after {0:?}")]
    Timeout(std::time::Duration),
}
