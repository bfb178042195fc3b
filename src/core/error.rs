// Copyright @yucwang 2026

use thiserror::Error;

/// Setup failures of a particle tracing worker. Per-particle termination is
/// never reported through this type.
#[derive(Debug, Error)]
pub enum TracerError {
    #[error("required resource '{0}' is not bound")]
    MissingResource(String),

    #[error("resource '{name}' is not a {expected}")]
    ResourceType { name: String, expected: &'static str },

    #[error("process() called before prepare()")]
    NotPrepared,

    #[error("malformed serialized data: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TracerError>;
