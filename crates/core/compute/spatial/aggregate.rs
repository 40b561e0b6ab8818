//! Precomputed aggregate hierarchy.
//!
//! One level per geohash precision. A node at level `n` covers every listing
//! whose geohash starts with the node id, so the children of a node are the
//! nodes one level down that share its id as prefix. Snapshots are immutable
//! once built; the engine swaps in a fresh one after a rebuild.

use super::rtree::{IndexedListing, envelopes};
use crate::error::{Result, TilescopeError};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tilescope_types::bbox::Bounds;
use tilescope_types::filter::subcategory_key;
use tilescope_types::node::{SpatialIndexNode, SubcategoryStats};
use tilescope_types::stats::IndexStats;
use tilescope_types::viewport::LatLng;

type NodeEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Nodes of one level with an R*-tree over their cell bounds.
#[derive(Debug)]
pub struct LevelIndex {
    level: u8,
    nodes: Vec<SpatialIndexNode>,
    tree: RTree<NodeEnvelope>,
}

impl LevelIndex {
    fn new(level: u8, mut nodes: Vec<SpatialIndexNode>) -> Self {
        nodes.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        let envelopes = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let rect = Rectangle::from_corners(
                    [node.bounds.west, node.bounds.south],
                    [node.bounds.east, node.bounds.north],
                );
                GeomWithData::new(rect, i)
            })
            .collect();

        Self {
            level,
            nodes,
            tree: RTree::bulk_load(envelopes),
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SpatialIndexNode> {
        self.nodes
            .binary_search_by(|node| node.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.nodes[i])
    }

    /// Nodes whose cell bounds intersect `bounds`, ordered by id.
    pub fn intersecting(&self, bounds: &Bounds) -> Vec<&SpatialIndexNode> {
        let mut hits: Vec<usize> = envelopes(bounds)
            .iter()
            .flat_map(|envelope| self.tree.locate_in_envelope_intersecting(envelope))
            .map(|entry| entry.data)
            .collect();
        hits.sort_unstable();
        hits.dedup();
        hits.into_iter().map(|i| &self.nodes[i]).collect()
    }
}

/// Immutable build of the whole hierarchy at one point-store generation.
#[derive(Debug)]
pub struct AggregateSnapshot {
    generation: u64,
    built_at: u64,
    build_duration_ms: f64,
    levels: BTreeMap<u8, LevelIndex>,
}

impl AggregateSnapshot {
    /// Aggregate `listings` into every level in `levels`.
    ///
    /// Every listing lands in exactly one node per level, so the node counts
    /// of any level sum to the number of listings.
    pub fn build<'a>(
        listings: impl IntoIterator<Item = &'a IndexedListing>,
        levels: &[u8],
        generation: u64,
    ) -> Result<Self> {
        let started = Instant::now();
        let built_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut cells: BTreeMap<u8, FxHashMap<&str, BTreeMap<String, SubcategoryStats>>> =
            levels.iter().map(|&l| (l, FxHashMap::default())).collect();

        let mut count = 0usize;
        for indexed in listings {
            let listing = &indexed.listing;
            let key = subcategory_key(listing.listing_type, &listing.property_type);
            for (&level, level_cells) in cells.iter_mut() {
                level_cells
                    .entry(indexed.cell(level))
                    .or_default()
                    .entry(key.clone())
                    .or_default()
                    .add(indexed.y, indexed.x, listing.price);
            }
            count += 1;
        }

        let mut built = BTreeMap::new();
        for (level, level_cells) in cells {
            let nodes = level_cells
                .into_iter()
                .map(|(id, subcategories)| make_node(id, level, subcategories, built_at))
                .collect::<Result<Vec<_>>>()?;
            built.insert(level, LevelIndex::new(level, nodes));
        }

        let build_duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "Built aggregate hierarchy for {} listings across {} levels in {:.2}ms",
            count,
            built.len(),
            build_duration_ms
        );

        Ok(Self {
            generation,
            built_at,
            build_duration_ms,
            levels: built,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn level(&self, level: u8) -> Option<&LevelIndex> {
        self.levels.get(&level)
    }

    /// Node lookup by id; the level is the id length.
    pub fn node(&self, id: &str) -> Option<&SpatialIndexNode> {
        let level = u8::try_from(id.len()).ok()?;
        self.level(level)?.get(id)
    }

    /// Children of `id` on the next built level, ordered by id.
    pub fn children(&self, id: &str) -> Vec<&SpatialIndexNode> {
        let parent_level = id.len() as u8;
        let Some((_, next)) = self.levels.range(parent_level + 1..).next() else {
            return Vec::new();
        };
        next.nodes
            .iter()
            .filter(|node| node.id.starts_with(id))
            .collect()
    }

    /// Fill the aggregate-related fields of `stats`.
    pub fn describe(&self, stats: &mut IndexStats) {
        stats.aggregate_generation = Some(self.generation);
        stats.nodes_per_level = self
            .levels
            .iter()
            .map(|(level, index)| (*level, index.len()))
            .collect();
        stats.built_at = Some(self.built_at);
        stats.build_duration_ms = self.build_duration_ms;
    }
}

fn make_node(
    id: &str,
    level: u8,
    subcategories: BTreeMap<String, SubcategoryStats>,
    updated_at: u64,
) -> Result<SpatialIndexNode> {
    let rect = geohash::decode_bbox(id)
        .map_err(|e| TilescopeError::InvalidInput(format!("Geohash cell {}: {}", id, e)))?;
    let bounds = Bounds::from_rect(rect);

    let mut total = SubcategoryStats::default();
    for stats in subcategories.values() {
        total.merge(stats);
    }
    let center = total.centroid().unwrap_or_else(|| {
        LatLng::new(
            (bounds.north + bounds.south) / 2.0,
            (bounds.east + bounds.west) / 2.0,
        )
    });

    Ok(SpatialIndexNode {
        id: id.to_string(),
        level,
        bounds,
        center,
        parent_id: (level > 1).then(|| id[..id.len() - 1].to_string()),
        total_count: total.count,
        min_price: total.min_price,
        max_price: total.max_price,
        avg_price: total.avg_price().unwrap_or(0.0),
        subcategories,
        updated_at,
    })
}

/// Shared handle the engine publishes after a rebuild.
pub type SharedSnapshot = Arc<AggregateSnapshot>;
