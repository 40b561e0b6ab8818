//! Error types for the tilescope engine.

use thiserror::Error;

pub use tilescope_types::error::{ErrorClass, SearchError};

/// Errors raised by ingestion, configuration and index maintenance.
///
/// Search itself reports the narrower [`SearchError`] taxonomy.
#[derive(Debug, Error)]
pub enum TilescopeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Engine is closed")]
    EngineClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Serialization error at line {line}: {source}")]
    SerializationAtLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TilescopeError>;
