//! The unified search operation.

use super::Engine;
use crate::compute::spatial::{IndexedListing, cluster_live, cluster_precomputed};
use crate::compute::validation::{validate_filters, validate_page, validate_viewport};
use crate::error::SearchError;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tilescope_types::filter::SortOrder;
use tilescope_types::listing::ListItem;
use tilescope_types::result::{
    ClusterSource, DisplayMode, MapData, SearchMeta, SearchRequest, SearchResult, total_pages,
};

fn compare(order: SortOrder, a: &IndexedListing, b: &IndexedListing) -> CmpOrdering {
    let (a, b) = (&a.listing, &b.listing);
    let primary = match order {
        SortOrder::Newest => b.listed_at.cmp(&a.listed_at),
        SortOrder::PriceAsc => a.price.total_cmp(&b.price),
        SortOrder::PriceDesc => b.price.total_cmp(&a.price),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// The `len` listings starting at `offset` under `order`.
///
/// Partially sorts `matching` in place; only the requested window ends up
/// fully ordered.
pub(crate) fn window(
    matching: &mut [&IndexedListing],
    order: SortOrder,
    offset: usize,
    len: usize,
) -> Vec<ListItem> {
    if offset >= matching.len() || len == 0 {
        return Vec::new();
    }
    let end = offset.saturating_add(len).min(matching.len());
    if end < matching.len() {
        matching.select_nth_unstable_by(end, |a, b| compare(order, a, b));
    }
    let head = &mut matching[..end];
    head.sort_unstable_by(|a, b| compare(order, a, b));
    head[offset..].iter().map(|l| l.listing.to_item()).collect()
}

impl Engine {
    /// Answer one viewport + filters + page query.
    ///
    /// `total`, `map_data` and `list_items` are computed against one read
    /// of the point store, so they always agree with each other:
    ///
    /// - `total` counts every listing inside the viewport passing the filters.
    /// - Cluster counts sum to at most `total`; item markers are a subset.
    /// - `list_items` is page `page` of the same set under `sort`.
    ///
    /// The call has no side effects on index data and is idempotent while the
    /// index is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilescope::prelude::*;
    ///
    /// let engine = Engine::with_listings(
    ///     Config::default(),
    ///     vec![Listing::new("a", 38.72, -9.14, 250_000.0, ListingType::Sale, "apartment")],
    /// )?;
    /// let viewport = Viewport::from_bounds(Bounds::new(39.0, 38.5, -9.0, -9.5), 10.0);
    /// let result = engine.search(&SearchRequest::new(viewport, Filters::new()))?;
    /// assert_eq!(result.total, 1);
    /// assert_eq!(result.map_count(), 1);
    /// # Ok::<(), tilescope::TilescopeError>(())
    /// ```
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        let started = Instant::now();
        self.searches.fetch_add(1, Ordering::Relaxed);

        validate_viewport(&request.viewport)?;
        validate_filters(&request.filters)?;
        validate_page(request.page, request.page_size, self.config.max_page_size)?;

        let snapshot = self.snapshot()?;
        let resolution = self.resolver.resolve(request.viewport.zoom);
        let bounds = &request.viewport.bounds;
        let filters = &request.filters;

        let points = self.points.read();
        let generation = points.generation();
        let mut matching = points.matching(bounds, filters);
        let total = matching.len() as u64;

        let (map_data, cluster_source) = match resolution.mode {
            DisplayMode::Clusters => {
                let precomputed =
                    filters.is_category_only() && snapshot.generation() == generation;
                let (clusters, source) =
                    match snapshot.level(resolution.level).filter(|_| precomputed) {
                        Some(index) => (
                            cluster_precomputed(
                                index,
                                bounds,
                                filters,
                                &matching,
                                self.config.max_clusters,
                            ),
                            ClusterSource::Precomputed,
                        ),
                        None => {
                            log::debug!(
                                "Live cluster aggregation at level {} (category-only: {}, snapshot generation {} vs {})",
                                resolution.level,
                                filters.is_category_only(),
                                snapshot.generation(),
                                generation
                            );
                            (
                                cluster_live(&matching, resolution.level, self.config.max_clusters),
                                ClusterSource::Live,
                            )
                        }
                    };
                (MapData::Clusters(clusters), Some(source))
            }
            DisplayMode::IndividualItems => (
                MapData::Items(window(
                    &mut matching,
                    SortOrder::Newest,
                    0,
                    self.config.max_visible_items,
                )),
                None,
            ),
        };

        let offset = (request.page as usize - 1).saturating_mul(request.page_size as usize);
        let list_items = window(
            &mut matching,
            request.sort,
            offset,
            request.page_size as usize,
        );
        drop(points);

        Ok(SearchResult {
            mode: resolution.mode,
            map_data,
            list_items,
            total,
            page: request.page,
            total_pages: total_pages(total, request.page_size),
            meta: SearchMeta {
                duration_ms: started.elapsed().as_secs_f64() * 1000.0,
                level: resolution.level,
                cluster_source,
                generation,
            },
        })
    }
}
