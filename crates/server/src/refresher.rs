//! Periodic aggregate refresh.

use crate::handler::Handler;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Rebuild aggregates every `every` while the engine has unapplied writes.
///
/// Stops once the engine is closed or the writer is gone.
pub fn spawn_refresher(handler: Handler, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let reader = handler.reader();
            if reader.is_closed() {
                break;
            }
            if reader.is_fresh() {
                continue;
            }
            match handler.request_rebuild().await {
                Ok(stats) => tracing::debug!(
                    "Refreshed aggregates at generation {} ({} nodes)",
                    stats.generation,
                    stats.total_nodes()
                ),
                Err(e) => {
                    tracing::warn!("Aggregate refresh stopped: {}", e);
                    break;
                }
            }
        }
    })
}
