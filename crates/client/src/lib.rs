//! Tilescope client
//!
//! Client half of a map/list browser: a single-writer [`ResultStore`], the
//! debounce/cancel [`Coordinator`] that feeds it, and the [`MapSession`]
//! driver that runs both against any [`SearchBackend`].
//!
//! # Backends
//!
//! - [`LocalBackend`]: in-process engine
//! - [`TilescopeClient`]: tarpc RPC (default transport)
//! - `TilescopeHttpClient`: REST API client, enable with the `http` feature
//!
//! # Example
//!
//! ```ignore
//! use tilescope_client::{CoordinatorConfig, MapSession, TilescopeClient};
//!
//! let client = TilescopeClient::connect(addr).await?;
//! let session = MapSession::spawn(client, CoordinatorConfig::default());
//! session.viewport_settled(viewport).await?;
//! let mut snapshots = session.subscribe();
//! snapshots.changed().await?;
//! ```

pub mod backend;
pub mod coordinator;
pub mod error;
pub mod store;
pub mod transport;

pub use backend::{LocalBackend, SearchBackend};
pub use coordinator::{
    Coordinator, CoordinatorConfig, Effect, MapSession, Phase, SessionEvent, Ticket,
};
pub use error::{ClientError, Result};
pub use store::{ResultStore, StoreError, StoreSnapshot};

// Re-export the default (RPC) client for convenience
pub use transport::rpc::TilescopeClient;

#[cfg(feature = "http")]
pub use transport::http::TilescopeHttpClient;
