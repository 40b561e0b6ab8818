//! Cluster assembly for a viewport.
//!
//! Two paths produce the same shape of output:
//!
//! - **Precomputed**: nodes fully inside the viewport contribute their stored
//!   subcategory aggregates; nodes cut by the viewport edge are re-aggregated
//!   from the matching listings that actually fall inside it. Only valid for
//!   category-only filters against a snapshot of the current generation.
//! - **Live**: matching listings are bucketed by their cell id.
//!
//! Either way every cluster count is exact for the filters and the viewport,
//! so cluster counts never add up to more than the search total.

use super::aggregate::LevelIndex;
use super::rtree::IndexedListing;
use rustc_hash::{FxHashMap, FxHashSet};
use tilescope_types::bbox::Bounds;
use tilescope_types::filter::Filters;
use tilescope_types::node::SubcategoryStats;
use tilescope_types::result::Cluster;

/// Build clusters by bucketing listings into their cells at `level`.
pub fn cluster_live(matching: &[&IndexedListing], level: u8, cap: usize) -> Vec<Cluster> {
    let mut buckets: FxHashMap<&str, SubcategoryStats> = FxHashMap::default();
    for indexed in matching {
        buckets
            .entry(indexed.cell(level))
            .or_default()
            .add(indexed.y, indexed.x, indexed.listing.price);
    }

    let clusters = buckets
        .into_iter()
        .filter_map(|(id, stats)| make_cluster(id, &stats, cell_bounds(id)))
        .collect();
    cap_clusters(clusters, cap)
}

/// Build clusters from stored node aggregates, re-aggregating edge nodes.
///
/// `matching` must hold exactly the listings inside `bounds` that pass
/// `filters`, and `index` must be built from the same point-store generation.
pub fn cluster_precomputed(
    index: &LevelIndex,
    bounds: &Bounds,
    filters: &Filters,
    matching: &[&IndexedListing],
    cap: usize,
) -> Vec<Cluster> {
    let level = index.level();
    let mut clusters = Vec::new();
    let mut edge: FxHashSet<&str> = FxHashSet::default();

    for node in index.intersecting(bounds) {
        if bounds.contains_bounds(&node.bounds) {
            let stats = node.aggregate_matching(filters);
            clusters.extend(make_cluster(&node.id, &stats, Some(node.bounds)));
        } else {
            edge.insert(node.id.as_str());
        }
    }

    if !edge.is_empty() {
        let mut partial: FxHashMap<&str, SubcategoryStats> = FxHashMap::default();
        for indexed in matching {
            let cell = indexed.cell(level);
            if edge.contains(cell) {
                partial
                    .entry(cell)
                    .or_default()
                    .add(indexed.y, indexed.x, indexed.listing.price);
            }
        }
        for (id, stats) in partial {
            let node_bounds = index.get(id).map(|node| node.bounds);
            clusters.extend(make_cluster(id, &stats, node_bounds));
        }
    }

    cap_clusters(clusters, cap)
}

/// Keep the `cap` largest clusters, ordered by count desc then id.
pub fn cap_clusters(mut clusters: Vec<Cluster>, cap: usize) -> Vec<Cluster> {
    clusters.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
    if clusters.len() > cap {
        log::debug!(
            "Dropping {} clusters beyond cap of {}",
            clusters.len() - cap,
            cap
        );
        clusters.truncate(cap);
    }
    clusters
}

fn make_cluster(id: &str, stats: &SubcategoryStats, bounds: Option<Bounds>) -> Option<Cluster> {
    let center = stats.centroid()?;
    Some(Cluster {
        id: id.to_string(),
        lat: center.lat,
        lng: center.lng,
        count: stats.count,
        avg_price: stats.avg_price(),
        bounds,
    })
}

fn cell_bounds(id: &str) -> Option<Bounds> {
    geohash::decode_bbox(id).ok().map(Bounds::from_rect)
}
