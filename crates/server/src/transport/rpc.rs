//! tarpc transport for tilescope server
//!
//! This is the default RPC transport: length-delimited JSON frames over TCP.

use futures::prelude::*;
use std::sync::Arc;
use tarpc::server::{self, Channel};
use tarpc::tokio_serde::formats::Json;
use tilescope::Engine;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{error, info};

use crate::config::ServerOptions;
use crate::handler::Handler;
use crate::protocol::TilescopeService;

/// Run the tarpc RPC server with default options.
pub async fn run_server(
    listener: tokio::net::TcpListener,
    engine: Arc<Engine>,
    shutdown: impl Future<Output = ()> + Unpin + Send + 'static,
) -> anyhow::Result<()> {
    let handler = crate::spawn_services(engine, &ServerOptions::default());
    serve(listener, handler, shutdown).await
}

/// Accept RPC connections until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    handler: Handler,
    mut shutdown: impl Future<Output = ()> + Unpin + Send + 'static,
) -> anyhow::Result<()> {
    info!("Tilescope RPC Server listening on {}", listener.local_addr()?);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((socket, peer)) => {
                        tracing::debug!("Accepted RPC connection from {}", peer);
                        let server = handler.clone();
                        tokio::spawn(async move {
                            let framed = Framed::new(socket, LengthDelimitedCodec::new());
                            let transport = tarpc::serde_transport::new(
                                framed,
                                Json::default()
                            );

                            server::BaseChannel::with_defaults(transport)
                                .execute(server.serve())
                                .for_each(|response| async move {
                                    tokio::spawn(response);
                                })
                                .await;
                        });
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping server...");
                break;
            }
        }
    }

    Ok(())
}
