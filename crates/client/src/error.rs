use thiserror::Error;
use tilescope_types::error::SearchError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),
    #[error("RPC error: {0}")]
    Rpc(#[from] tarpc::client::RpcError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Session closed")]
    Closed,
}

impl ClientError {
    /// Collapse a client failure into the search error taxonomy.
    ///
    /// Transport failures are transient from the UI's point of view and
    /// surface as `IndexUnavailable`; an expired RPC deadline is a `Timeout`.
    pub fn into_search_error(self) -> SearchError {
        match self {
            Self::Search(err) => err,
            Self::Rpc(tarpc::client::RpcError::DeadlineExceeded) => SearchError::Timeout,
            Self::Closed => SearchError::Canceled,
            other => SearchError::IndexUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
