//! Engine configuration.
//!
//! Also re-exports the wire types from `tilescope-types` for convenience.
use serde::de::Error;

pub use tilescope_types::bbox::Bounds;
pub use tilescope_types::filter::{Filters, ListingType, SortOrder};
pub use tilescope_types::listing::{ListItem, Listing};
pub use tilescope_types::node::{SpatialIndexNode, SubcategoryStats};
pub use tilescope_types::result::{
    Cluster, ClusterSource, DisplayMode, MapData, SearchMeta, SearchRequest, SearchResult,
};
pub use tilescope_types::stats::IndexStats;
pub use tilescope_types::viewport::{LatLng, Viewport};

use crate::compute::zoom::{MAX_LEVEL, MIN_LEVEL};

/// Engine configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Aggregation levels (geohash precisions) the index precomputes.
    #[serde(default = "Config::default_levels")]
    pub levels: Vec<u8>,

    /// Zoom at and above which the map shows individual listings.
    #[serde(default = "Config::default_individual_zoom")]
    pub individual_zoom: f64,

    /// Upper bound on clusters returned for one viewport.
    #[serde(default = "Config::default_max_clusters")]
    pub max_clusters: usize,

    /// Upper bound on item markers returned in individual-items mode.
    #[serde(default = "Config::default_max_visible_items")]
    pub max_visible_items: usize,

    #[serde(default = "Config::default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "Config::default_max_page_size")]
    pub max_page_size: u32,
}

impl Config {
    fn default_levels() -> Vec<u8> {
        (MIN_LEVEL..=MAX_LEVEL).collect()
    }

    const fn default_individual_zoom() -> f64 {
        15.0
    }

    const fn default_max_clusters() -> usize {
        200
    }

    const fn default_max_visible_items() -> usize {
        500
    }

    const fn default_page_size() -> u32 {
        20
    }

    const fn default_max_page_size() -> u32 {
        100
    }

    pub fn with_levels(mut self, levels: impl IntoIterator<Item = u8>) -> Self {
        let mut levels: Vec<u8> = levels.into_iter().collect();
        levels.sort_unstable();
        levels.dedup();
        self.levels = levels;
        self
    }

    pub fn with_individual_zoom(mut self, zoom: f64) -> Self {
        self.individual_zoom = zoom;
        self
    }

    pub fn with_max_clusters(mut self, max: usize) -> Self {
        assert!(max > 0, "Cluster cap must be greater than zero");
        self.max_clusters = max;
        self
    }

    pub fn with_max_visible_items(mut self, max: usize) -> Self {
        assert!(max > 0, "Visible item cap must be greater than zero");
        if max > 10_000 {
            log::warn!(
                "Visible item cap of {} is very large; individual-items responses \
                may become expensive to render.",
                max
            );
        }
        self.max_visible_items = max;
        self
    }

    pub fn with_page_sizes(mut self, default: u32, max: u32) -> Self {
        self.default_page_size = default;
        self.max_page_size = max;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.levels.is_empty() {
            return Err("At least one aggregation level is required".to_string());
        }
        if let Some(bad) = self
            .levels
            .iter()
            .find(|l| !(MIN_LEVEL..=MAX_LEVEL).contains(*l))
        {
            return Err(format!(
                "Aggregation level {} outside supported range [{}, {}]",
                bad, MIN_LEVEL, MAX_LEVEL
            ));
        }
        if self.levels.windows(2).any(|w| w[0] >= w[1]) {
            return Err("Aggregation levels must be strictly increasing".to_string());
        }
        if !self.individual_zoom.is_finite() || self.individual_zoom < 0.0 {
            return Err(format!(
                "Individual-items zoom must be a non-negative number, got: {}",
                self.individual_zoom
            ));
        }
        if self.max_clusters == 0 {
            return Err("Cluster cap must be greater than zero".to_string());
        }
        if self.max_visible_items == 0 {
            return Err("Visible item cap must be greater than zero".to_string());
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(format!(
                "Default page size {} must be in [1, {}]",
                self.default_page_size, self.max_page_size
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            levels: Self::default_levels(),
            individual_zoom: Self::default_individual_zoom(),
            max_clusters: Self::default_max_clusters(),
            max_visible_items: Self::default_max_visible_items(),
            default_page_size: Self::default_page_size(),
            max_page_size: Self::default_max_page_size(),
        }
    }
}
