//! Handler implementation for the tilescope RPC service

use crate::protocol::TilescopeService;
use crate::reader::Reader;
use crate::writer::WriteOp;
use std::sync::Arc;
use tarpc::context;
use tilescope::Engine;
use tilescope::validation::validate_listing;
use tilescope_types::error::SearchError;
use tilescope_types::listing::Listing;
use tilescope_types::result::{SearchRequest, SearchResult};
use tilescope_types::stats::IndexStats;
use tokio::sync::{mpsc, oneshot};

const OVERWHELMED: &str = "Server storage is overwhelmed or shutting down";

/// Shared by every transport: reads go straight to the engine, writes are
/// queued for the background writer.
#[derive(Clone)]
pub struct Handler {
    write_tx: mpsc::Sender<WriteOp>,
    reader: Reader,
}

impl Handler {
    pub fn new(engine: Arc<Engine>, write_tx: mpsc::Sender<WriteOp>) -> Self {
        let reader = Reader::new(engine);
        Self { write_tx, reader }
    }

    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    async fn submit(&self, op: WriteOp) -> Result<(), String> {
        self.write_tx.send(op).await.map_err(|_| OVERWHELMED.to_string())
    }

    /// Validate and queue a listing write.
    pub async fn enqueue_upsert(&self, listing: Listing) -> Result<(), String> {
        validate_listing(&listing).map_err(|e| e.to_string())?;
        self.submit(WriteOp::Upsert(listing)).await
    }

    pub async fn enqueue_remove(&self, id: String) -> Result<(), String> {
        self.submit(WriteOp::Remove(id)).await
    }

    /// Queue a rebuild and wait for it to finish.
    pub async fn request_rebuild(&self) -> Result<IndexStats, String> {
        let (reply, done) = oneshot::channel();
        self.submit(WriteOp::Rebuild { reply: Some(reply) }).await?;
        done.await.map_err(|_| OVERWHELMED.to_string())?
    }
}

impl TilescopeService for Handler {
    async fn search(
        self,
        _: context::Context,
        request: SearchRequest,
    ) -> Result<SearchResult, SearchError> {
        self.reader.search(request).await
    }

    async fn upsert_listing(self, _: context::Context, listing: Listing) -> Result<(), String> {
        self.enqueue_upsert(listing).await
    }

    async fn remove_listing(self, _: context::Context, id: String) -> Result<(), String> {
        self.enqueue_remove(id).await
    }

    async fn get_listing(
        self,
        _: context::Context,
        id: String,
    ) -> Result<Option<Listing>, String> {
        self.reader.get_listing(&id)
    }

    async fn rebuild_index(self, _: context::Context) -> Result<IndexStats, String> {
        self.request_rebuild().await
    }

    async fn stats(self, _: context::Context) -> IndexStats {
        self.reader.stats()
    }
}
