use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure modes of the unified search operation.
///
/// Serializable so it crosses RPC and HTTP transports unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SearchError {
    #[error("invalid viewport: {0}")]
    InvalidViewport(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("spatial index unavailable: {0}")]
    IndexUnavailable(String),
    #[error("search timed out")]
    Timeout,
    #[error("search canceled")]
    Canceled,
}

/// How the UI should treat a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad viewport or filter; persists until the caller corrects the input.
    CallerBug,
    /// Worth a dismissible banner; the next interaction retries.
    Transient,
    /// Bookkeeping only, never shown.
    Internal,
}

impl SearchError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidViewport(_) | Self::InvalidFilter(_) => ErrorClass::CallerBug,
            Self::IndexUnavailable(_) | Self::Timeout => ErrorClass::Transient,
            Self::Canceled => ErrorClass::Internal,
        }
    }
}
