use std::sync::Arc;
use tilescope::Engine;
use tilescope_types::listing::Listing;
use tilescope_types::stats::IndexStats;
use tokio::sync::{mpsc, oneshot};

/// Write operation to be buffered and executed by background worker
#[derive(Debug)]
pub enum WriteOp {
    Upsert(Listing),
    Remove(String),
    /// Rebuild aggregates; ordered after every write queued before it.
    Rebuild {
        reply: Option<oneshot::Sender<Result<IndexStats, String>>>,
    },
}

/// Returns the sender channel to be used by the handler
pub fn spawn_background_writer(engine: Arc<Engine>, buffer_size: usize) -> mpsc::Sender<WriteOp> {
    let (tx, mut rx) = mpsc::channel(buffer_size);

    // Dedicated thread so aggregate rebuilds never block the tokio runtime
    std::thread::spawn(move || {
        while let Some(op) = rx.blocking_recv() {
            match op {
                WriteOp::Upsert(listing) => {
                    let id = listing.id.clone();
                    if let Err(e) = engine.upsert_listing(listing) {
                        tracing::error!("Background write failed (upsert {}): {}", id, e);
                    }
                }
                WriteOp::Remove(id) => {
                    if let Err(e) = engine.remove_listing(&id) {
                        tracing::error!("Background write failed (remove {}): {}", id, e);
                    }
                }
                WriteOp::Rebuild { reply } => {
                    let result = engine.rebuild_aggregates().map_err(|e| e.to_string());
                    if let Err(e) = &result {
                        tracing::error!("Aggregate rebuild failed: {}", e);
                    }
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    }
                }
            }
        }
        tracing::info!("Background writer shutting down");
    });

    tx
}
