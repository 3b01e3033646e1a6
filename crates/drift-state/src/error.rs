use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),
}
