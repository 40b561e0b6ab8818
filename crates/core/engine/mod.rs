//! The search engine: a live point store plus a periodically rebuilt
//! aggregate hierarchy.
//!
//! Writes go to the point store and bump its generation. The aggregate
//! hierarchy is rebuilt out of band and published as an immutable snapshot,
//! so readers never observe a partially written node.

use crate::compute::spatial::{AggregateSnapshot, PointStore, SharedSnapshot};
use crate::compute::validation::{validate_bounds, validate_filters, validate_listing};
use crate::compute::zoom::ZoomResolver;
use crate::config::Config;
use crate::error::{Result, SearchError, TilescopeError};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tilescope_types::bbox::Bounds;
use tilescope_types::filter::{Filters, SortOrder};
use tilescope_types::listing::{ListItem, Listing};
use tilescope_types::node::SpatialIndexNode;
use tilescope_types::result::SearchRequest;
use tilescope_types::stats::IndexStats;
use tilescope_types::viewport::Viewport;

pub mod ingest;
mod search;

/// Viewport-driven spatial search engine.
///
/// Cheap to clone; clones share the same store and snapshot.
#[derive(Clone)]
pub struct Engine {
    pub(crate) points: Arc<RwLock<PointStore>>,
    pub(crate) aggregates: Arc<RwLock<Option<SharedSnapshot>>>,
    pub(crate) closed: Arc<AtomicBool>,
    pub(crate) searches: Arc<AtomicU64>,
    pub(crate) resolver: ZoomResolver,
    pub(crate) config: Config,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("listings", &self.len())
            .field("closed", &self.is_closed())
            .field("config", &self.config)
            .finish()
    }
}

impl Engine {
    /// Create an empty engine. Searches fail with `IndexUnavailable` until
    /// [`Engine::rebuild_aggregates`] has run once.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(TilescopeError::InvalidConfig)?;
        let resolver = ZoomResolver::new(&config.levels, config.individual_zoom);

        Ok(Self {
            points: Arc::new(RwLock::new(PointStore::new())),
            aggregates: Arc::new(RwLock::new(None)),
            closed: Arc::new(AtomicBool::new(false)),
            searches: Arc::new(AtomicU64::new(0)),
            resolver,
            config,
        })
    }

    /// Create an engine from a batch of listings and build the aggregates.
    pub fn with_listings(config: Config, listings: Vec<Listing>) -> Result<Self> {
        for listing in &listings {
            validate_listing(listing)?;
        }
        let engine = Self::new(config)?;
        *engine.points.write() = PointStore::bulk_load(listings)?;
        engine.rebuild_aggregates()?;
        Ok(engine)
    }

    pub fn builder() -> crate::builder::EngineBuilder {
        crate::builder::EngineBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &ZoomResolver {
        &self.resolver
    }

    /// First-page request sized by `Config::default_page_size`.
    pub fn request(&self, viewport: Viewport, filters: Filters) -> SearchRequest {
        SearchRequest::new(viewport, filters).page(1, self.config.default_page_size)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TilescopeError::EngineClosed);
        }
        Ok(())
    }

    /// Insert or replace a listing. Returns the previous version, if any.
    ///
    /// The change is visible to searches immediately; cluster aggregates
    /// fall back to live computation until the next rebuild.
    pub fn upsert_listing(&self, listing: Listing) -> Result<Option<Listing>> {
        self.ensure_open()?;
        validate_listing(&listing)?;
        let id = listing.id.clone();
        let previous = self.points.write().upsert(listing)?;
        log::debug!(
            "Upserted listing {} ({})",
            id,
            if previous.is_some() { "replaced" } else { "new" }
        );
        Ok(previous.map(Arc::unwrap_or_clone))
    }

    /// Upsert a batch under a single write lock.
    pub fn upsert_listings(&self, listings: impl IntoIterator<Item = Listing>) -> Result<usize> {
        self.ensure_open()?;
        let listings: Vec<Listing> = listings.into_iter().collect();
        for listing in &listings {
            validate_listing(listing)?;
        }
        let count = listings.len();
        let mut points = self.points.write();
        for listing in listings {
            points.upsert(listing)?;
        }
        Ok(count)
    }

    pub fn remove_listing(&self, id: &str) -> Result<Option<Listing>> {
        self.ensure_open()?;
        Ok(self.points.write().remove(id).map(Arc::unwrap_or_clone))
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        self.ensure_open()?;
        Ok(self.points.read().get(id).map(|l| Listing::clone(l)))
    }

    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    /// Recompute every configured level from a snapshot of the point store
    /// and publish it.
    ///
    /// The point store is only read-locked while entries are copied out;
    /// searches keep using the previous snapshot until the swap.
    pub fn rebuild_aggregates(&self) -> Result<IndexStats> {
        self.ensure_open()?;

        let (entries, generation) = {
            let points = self.points.read();
            (points.iter().cloned().collect::<Vec<_>>(), points.generation())
        };
        let snapshot = Arc::new(AggregateSnapshot::build(
            &entries,
            &self.config.levels,
            generation,
        )?);

        {
            let mut current = self.aggregates.write();
            match current.as_ref() {
                Some(existing) if existing.generation() > generation => {
                    log::debug!(
                        "Discarding aggregate build at generation {}; generation {} already published",
                        generation,
                        existing.generation()
                    );
                }
                _ => *current = Some(snapshot),
            }
        }

        let stats = self.stats();
        log::info!(
            "Rebuilt aggregates: {} listings, {} nodes, generation {} in {:.2}ms",
            stats.listing_count,
            stats.total_nodes(),
            generation,
            stats.build_duration_ms
        );
        Ok(stats)
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats::new();
        {
            let points = self.points.read();
            stats.listing_count = points.len();
            stats.generation = points.generation();
        }
        if let Some(snapshot) = self.aggregates.read().as_ref() {
            snapshot.describe(&mut stats);
        }
        stats
    }

    /// Number of search calls served since the engine was created.
    pub fn search_count(&self) -> u64 {
        self.searches.load(Ordering::Relaxed)
    }

    /// Whether the published aggregates reflect every write.
    pub fn is_fresh(&self) -> bool {
        self.stats().is_fresh()
    }

    /// Stop serving. Subsequent searches fail with `IndexUnavailable` and
    /// writes fail with `EngineClosed`.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.aggregates.write().take();
            log::info!("Engine closed after {} searches", self.search_count());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn snapshot(&self) -> std::result::Result<SharedSnapshot, SearchError> {
        if self.is_closed() {
            return Err(SearchError::IndexUnavailable("engine is closed".to_string()));
        }
        self.aggregates.read().clone().ok_or_else(|| {
            SearchError::IndexUnavailable("aggregate hierarchy has not been built".to_string())
        })
    }

    /// Nodes of `level` intersecting `bounds` with a non-zero count, largest
    /// first, capped at `max_clusters`.
    pub fn query_nodes(
        &self,
        level: u8,
        bounds: &Bounds,
    ) -> std::result::Result<Vec<SpatialIndexNode>, SearchError> {
        validate_bounds(bounds)?;
        let snapshot = self.snapshot()?;
        let index = snapshot.level(level).ok_or_else(|| {
            SearchError::IndexUnavailable(format!("level {} is not built", level))
        })?;

        let mut nodes: Vec<SpatialIndexNode> = index
            .intersecting(bounds)
            .into_iter()
            .filter(|node| node.total_count > 0)
            .cloned()
            .collect();
        nodes.sort_unstable_by(|a, b| {
            b.total_count
                .cmp(&a.total_count)
                .then_with(|| a.id.cmp(&b.id))
        });
        nodes.truncate(self.config.max_clusters);
        Ok(nodes)
    }

    /// Listings inside `bounds` passing `filters`, newest first, capped at
    /// `max_visible_items`.
    pub fn query_points(
        &self,
        bounds: &Bounds,
        filters: &Filters,
    ) -> std::result::Result<Vec<ListItem>, SearchError> {
        validate_bounds(bounds)?;
        validate_filters(filters)?;
        self.snapshot()?;

        let points = self.points.read();
        let mut matching = points.matching(bounds, filters);
        Ok(search::window(
            &mut matching,
            SortOrder::Newest,
            0,
            self.config.max_visible_items,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescope_types::filter::ListingType;

    fn listing(id: &str, lat: f64, lng: f64) -> Listing {
        Listing::new(id, lat, lng, 100.0, ListingType::Sale, "apartment")
    }

    #[test]
    fn test_new_engine_rejects_bad_config() {
        let config = Config::default().with_levels([9]);
        assert!(matches!(
            Engine::new(config),
            Err(TilescopeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_write_bumps_generation_and_staleness() {
        let engine = Engine::with_listings(Config::default(), vec![listing("a", 1.0, 1.0)]).unwrap();
        assert!(engine.is_fresh());

        engine.upsert_listing(listing("b", 2.0, 2.0)).unwrap();
        assert!(!engine.is_fresh());
        assert_eq!(engine.len(), 2);

        let stats = engine.rebuild_aggregates().unwrap();
        assert!(stats.is_fresh());
        assert_eq!(stats.listing_count, 2);
        assert_eq!(stats.nodes_per_level.len(), 6);
    }

    #[test]
    fn test_request_uses_configured_page_size() {
        let config = Config::default().with_page_sizes(2, 10);
        let listings = (0..5).map(|i| listing(&format!("l{i}"), 1.0 + i as f64 * 0.01, 1.0));
        let engine = Engine::with_listings(config, listings.collect()).unwrap();

        let viewport = Viewport::from_bounds(Bounds::new(2.0, 0.0, 2.0, 0.0), 8.0);
        let request = engine.request(viewport, Filters::new());
        assert_eq!((request.page, request.page_size), (1, 2));

        let result = engine.search(&request).unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.list_items.len(), 2);
    }

    #[test]
    fn test_upsert_rejects_invalid_listing() {
        let engine = Engine::new(Config::default()).unwrap();
        assert!(matches!(
            engine.upsert_listing(listing("a", 100.0, 0.0)),
            Err(TilescopeError::InvalidInput(_))
        ));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_get_and_remove() {
        let engine = Engine::new(Config::default()).unwrap();
        engine.upsert_listing(listing("a", 1.0, 1.0)).unwrap();
        assert_eq!(engine.get_listing("a").unwrap().unwrap().id, "a");
        assert!(engine.remove_listing("a").unwrap().is_some());
        assert!(engine.get_listing("a").unwrap().is_none());
    }

    #[test]
    fn test_query_nodes_requires_build() {
        let engine = Engine::new(Config::default()).unwrap();
        let bounds = Bounds::new(10.0, -10.0, 10.0, -10.0);
        assert!(matches!(
            engine.query_nodes(2, &bounds),
            Err(SearchError::IndexUnavailable(_))
        ));

        engine.upsert_listing(listing("a", 1.0, 1.0)).unwrap();
        engine.rebuild_aggregates().unwrap();
        let nodes = engine.query_nodes(2, &bounds).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].total_count, 1);
        assert!(engine.query_nodes(9, &bounds).is_err());
    }

    #[test]
    fn test_query_points_newest_first() {
        let engine = Engine::with_listings(
            Config::default(),
            vec![
                listing("old", 1.0, 1.0).listed_at(10),
                listing("new", 1.5, 1.5).listed_at(20),
            ],
        )
        .unwrap();
        let items = engine
            .query_points(&Bounds::new(2.0, 0.0, 2.0, 0.0), &Filters::new())
            .unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_close() {
        let engine = Engine::with_listings(Config::default(), vec![listing("a", 1.0, 1.0)]).unwrap();
        engine.close();
        assert!(engine.is_closed());
        assert!(matches!(
            engine.upsert_listing(listing("b", 1.0, 1.0)),
            Err(TilescopeError::EngineClosed)
        ));
        assert!(matches!(
            engine.query_points(&Bounds::new(2.0, 0.0, 2.0, 0.0), &Filters::new()),
            Err(SearchError::IndexUnavailable(_))
        ));
    }
}
