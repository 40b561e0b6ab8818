//! Tilescope Server
//!
//! Serves the tilescope search engine over the network.
//!
//! # Transports
//!
//! - **RPC** (default): tarpc-based transport
//! - **HTTP** (optional): REST API, enable with `http` feature
//!
//! Searches run against the engine directly. Listing writes and aggregate
//! rebuilds are queued to a dedicated writer thread; an optional refresher
//! rebuilds aggregates periodically while writes are pending.
//!
//! # Example
//!
//! ```ignore
//! use tilescope_server::run_server;
//!
//! run_server(listener, engine, shutdown).await?;
//! ```

pub mod config;
pub mod handler;
pub mod protocol;
pub mod reader;
pub mod refresher;
pub mod transport;
pub mod writer;

use std::sync::Arc;
use tilescope::Engine;

pub use config::{ServerOptions, load_engine_config};
pub use handler::Handler;
pub use protocol::{TilescopeService, TilescopeServiceClient};

// Re-export default transport for convenience
pub use transport::rpc::run_server;

/// Start the background writer (and refresher, if configured) and return
/// the handler every transport serves from.
pub fn spawn_services(engine: Arc<Engine>, options: &ServerOptions) -> Handler {
    let write_tx = writer::spawn_background_writer(engine.clone(), options.write_buffer);
    let handler = Handler::new(engine, write_tx);
    if let Some(every) = options.refresh_interval {
        refresher::spawn_refresher(handler.clone(), every);
    }
    handler
}
