use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid provider: {0}")]
    InvalidProvider(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),
}
