use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
