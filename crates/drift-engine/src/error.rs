use thiserror::Error;

use drift_graph::GraphError;
use drift_state::StateError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("drift analysis error: {0}")]
    Internal(String),
}
