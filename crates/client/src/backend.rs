//! The seam between the coordinator and whatever answers searches.

use crate::coordinator::CoordinatorConfig;
use crate::error::{ClientError, Result};
use std::future::Future;
use std::sync::Arc;
use tilescope::Engine;
use tilescope_types::result::{SearchRequest, SearchResult};

/// Anything that can answer a unified search asynchronously.
pub trait SearchBackend: Send + Sync + 'static {
    fn search(&self, request: SearchRequest) -> impl Future<Output = Result<SearchResult>> + Send;
}

impl<B: SearchBackend> SearchBackend for Arc<B> {
    fn search(&self, request: SearchRequest) -> impl Future<Output = Result<SearchResult>> + Send {
        (**self).search(request)
    }
}

/// In-process backend over a shared engine.
#[derive(Clone, Debug)]
pub struct LocalBackend {
    engine: Arc<Engine>,
}

impl LocalBackend {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Coordinator defaults whose page size follows the engine's config.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::default().with_page_size(self.engine.config().default_page_size)
    }
}

impl SearchBackend for LocalBackend {
    async fn search(&self, request: SearchRequest) -> Result<SearchResult> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.search(&request))
            .await
            .map_err(|e| ClientError::Server(format!("Search task failed: {}", e)))?
            .map_err(ClientError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescope::{Bounds, Config, Filters, Listing, ListingType, Viewport};

    #[tokio::test]
    async fn test_local_backend_follows_engine_paging() {
        let listings = (0..7).map(|i| {
            Listing::new(
                format!("l{i}"),
                10.0 + i as f64 * 0.01,
                10.0,
                100.0,
                ListingType::Rent,
                "room",
            )
        });
        let engine = Engine::with_listings(
            Config::default().with_page_sizes(3, 50),
            listings.collect(),
        )
        .unwrap();
        let backend = LocalBackend::new(Arc::new(engine));
        assert_eq!(backend.coordinator_config().page_size, 3);

        let viewport = Viewport::from_bounds(Bounds::new(11.0, 9.0, 11.0, 9.0), 8.0);
        let request = backend.engine().request(viewport, Filters::new());
        let result = backend.search(request).await.unwrap();
        assert_eq!(result.list_items.len(), 3);
        assert_eq!(result.total_pages, 3);
    }
}
