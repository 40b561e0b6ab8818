//! Point store: every listing indexed by position in an R*-tree.
//!
//! The tree holds one entry per listing id. Each entry carries the listing's
//! finest-level geohash so aggregate cells can be derived by prefix without
//! re-encoding.

use crate::compute::zoom::MAX_LEVEL;
use crate::error::{Result, TilescopeError};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;
use tilescope_types::bbox::Bounds;
use tilescope_types::filter::Filters;
use tilescope_types::listing::Listing;

/// A listing positioned in the R*-tree (x = longitude, y = latitude).
#[derive(Debug, Clone)]
pub struct IndexedListing {
    pub x: f64,
    pub y: f64,
    /// Geohash at the finest aggregation level.
    pub geohash: String,
    pub listing: Arc<Listing>,
}

/// Position used for both the tree and the geohash.
///
/// Geohash cells are half-open on their north and east edges, so longitude
/// 180 is folded onto -180 and latitude 90 moves one ulp south. Without this
/// the encoder wraps such points into a cell on the far side of the globe.
pub fn normalize_position(lat: f64, lng: f64) -> (f64, f64) {
    let lat = if lat >= 90.0 { 90.0_f64.next_down() } else { lat };
    let lng = if lng >= 180.0 { -180.0 } else { lng };
    (lat, lng)
}

impl IndexedListing {
    pub fn new(listing: Arc<Listing>) -> Result<Self> {
        let (lat, lng) = normalize_position(listing.lat, listing.lng);
        let geohash = geohash::encode(geohash::Coord { x: lng, y: lat }, MAX_LEVEL as usize)
        .map_err(|e| {
            TilescopeError::InvalidInput(format!("Listing {}: {}", listing.id, e))
        })?;

        Ok(Self {
            x: lng,
            y: lat,
            geohash,
            listing,
        })
    }

    pub fn id(&self) -> &str {
        &self.listing.id
    }

    /// Cell id of this listing at `level`.
    #[inline]
    pub fn cell(&self, level: u8) -> &str {
        &self.geohash[..(level as usize).min(self.geohash.len())]
    }
}

impl PartialEq for IndexedListing {
    fn eq(&self, other: &Self) -> bool {
        self.listing.id == other.listing.id && self.x == other.x && self.y == other.y
    }
}

impl RTreeObject for IndexedListing {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedListing {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Planar envelopes covered by `bounds`; two when the box wraps the antimeridian.
pub fn envelopes(bounds: &Bounds) -> SmallVec<[AABB<[f64; 2]>; 2]> {
    bounds
        .to_rects()
        .into_iter()
        .map(|rect| {
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
        })
        .collect()
}

/// Mutable set of listings with a spatial index and an id lookup.
///
/// `generation` increases on every effective write so readers can tell
/// whether derived data (the aggregate hierarchy) still reflects the store.
#[derive(Debug, Default)]
pub struct PointStore {
    tree: RTree<IndexedListing>,
    by_id: FxHashMap<String, IndexedListing>,
    generation: u64,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a batch using R*-tree bulk loading.
    ///
    /// Later duplicates of an id replace earlier ones.
    pub fn bulk_load(listings: impl IntoIterator<Item = Listing>) -> Result<Self> {
        let mut by_id: FxHashMap<String, IndexedListing> = FxHashMap::default();
        for listing in listings {
            let indexed = IndexedListing::new(Arc::new(listing))?;
            by_id.insert(indexed.listing.id.clone(), indexed);
        }
        let tree = RTree::bulk_load(by_id.values().cloned().collect());
        let generation = u64::from(!by_id.is_empty());

        Ok(Self {
            tree,
            by_id,
            generation,
        })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Insert or replace a listing. Returns the previous version, if any.
    pub fn upsert(&mut self, listing: Listing) -> Result<Option<Arc<Listing>>> {
        let indexed = IndexedListing::new(Arc::new(listing))?;
        let previous = self.by_id.insert(indexed.listing.id.clone(), indexed.clone());

        if let Some(old) = &previous {
            self.tree.remove(old);
        }
        self.tree.insert(indexed);
        self.generation += 1;

        Ok(previous.map(|old| old.listing))
    }

    pub fn remove(&mut self, id: &str) -> Option<Arc<Listing>> {
        let old = self.by_id.remove(id)?;
        self.tree.remove(&old);
        self.generation += 1;
        Some(old.listing)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Listing>> {
        self.by_id.get(id).map(|indexed| &indexed.listing)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedListing> {
        self.by_id.values()
    }

    /// Listings located inside `bounds` (edges inclusive).
    pub fn within<'a>(&'a self, bounds: &Bounds) -> impl Iterator<Item = &'a IndexedListing> + 'a {
        envelopes(bounds)
            .into_iter()
            .flat_map(move |envelope| self.tree.locate_in_envelope(&envelope))
    }

    /// Listings inside `bounds` that pass every filter predicate.
    pub fn matching<'a>(&'a self, bounds: &Bounds, filters: &Filters) -> Vec<&'a IndexedListing> {
        self.within(bounds)
            .filter(|indexed| filters.matches(&indexed.listing))
            .collect()
    }
}
