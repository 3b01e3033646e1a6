use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("dependency cycle detected in resource graph")]
    DependencyCycleDetected,

    #[error("unknown node address: {0}")]
    UnknownNode(String),
}
