use crate::bbox::Bounds;
use crate::filter::{Filters, SortOrder};
use crate::listing::ListItem;
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};

/// Whether the map shows aggregated clusters or individual listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    Clusters,
    IndividualItems,
}

/// An aggregated map marker standing for `count` listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub count: u64,
    pub avg_price: Option<f64>,
    pub bounds: Option<Bounds>,
}

/// What the map surface draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MapData {
    Clusters(Vec<Cluster>),
    Items(Vec<ListItem>),
}

impl MapData {
    pub fn len(&self) -> usize {
        match self {
            Self::Clusters(c) => c.len(),
            Self::Items(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> DisplayMode {
        match self {
            Self::Clusters(_) => DisplayMode::Clusters,
            Self::Items(_) => DisplayMode::IndividualItems,
        }
    }
}

/// Where cluster aggregates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterSource {
    /// Node aggregates from the precomputed hierarchy (edge cells computed live).
    Precomputed,
    /// Aggregated on the fly from the filtered listings in the viewport.
    Live,
}

/// Timing and provenance metadata attached to every result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMeta {
    pub duration_ms: f64,
    pub level: u8,
    pub cluster_source: Option<ClusterSource>,
    /// Generation of the listing store the result was computed against.
    pub generation: u64,
}

/// Input of the unified search operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub viewport: Viewport,
    #[serde(default)]
    pub filters: Filters,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub sort: SortOrder,
}

impl SearchRequest {
    pub fn new(viewport: Viewport, filters: Filters) -> Self {
        Self {
            viewport,
            filters,
            page: 1,
            page_size: 20,
            sort: SortOrder::default(),
        }
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// The single unit exchanged between the search operation and the client store.
///
/// `total` is computed once and drives both the map badge and the list pager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub mode: DisplayMode,
    pub map_data: MapData,
    pub list_items: Vec<ListItem>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub meta: SearchMeta,
}

impl SearchResult {
    /// Sum of cluster counts, or the number of item markers.
    pub fn map_count(&self) -> u64 {
        match &self.map_data {
            MapData::Clusters(clusters) => clusters.iter().map(|c| c.count).sum(),
            MapData::Items(items) => items.len() as u64,
        }
    }

    pub fn clusters(&self) -> Option<&[Cluster]> {
        match &self.map_data {
            MapData::Clusters(c) => Some(c),
            MapData::Items(_) => None,
        }
    }

    pub fn items(&self) -> Option<&[ListItem]> {
        match &self.map_data {
            MapData::Items(i) => Some(i),
            MapData::Clusters(_) => None,
        }
    }
}

/// `ceil(total / page_size)`, zero when there is nothing to page through.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64).min(u32::MAX as u64) as u32
}
