//! Transport layer for tilescope server
//!
//! Available transports:
//! - `rpc` - tarpc-based RPC (default)
//! - `http` - HTTP/REST API (requires `http` feature)

pub mod rpc;

#[cfg(feature = "http")]
pub mod http;
