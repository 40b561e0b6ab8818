use std::sync::Arc;
use tilescope::Engine;
use tilescope_types::error::SearchError;
use tilescope_types::listing::Listing;
use tilescope_types::result::{SearchRequest, SearchResult};
use tilescope_types::stats::IndexStats;

#[derive(Clone)]
pub struct Reader {
    engine: Arc<Engine>,
}

impl Reader {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Run a search on the blocking pool; it is CPU-bound.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResult, SearchError> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.search(&request))
            .await
            .map_err(|e| SearchError::IndexUnavailable(format!("Internal error: {}", e)))?
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<Listing>, String> {
        self.engine
            .get_listing(id)
            .map_err(|e| format!("Internal error: {}", e))
    }

    pub fn stats(&self) -> IndexStats {
        self.engine.stats()
    }

    pub fn is_fresh(&self) -> bool {
        self.engine.is_fresh()
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_closed()
    }
}
