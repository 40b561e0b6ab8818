//! Viewport-driven spatial search and clustering for map/list browsers.
//!
//! ## Features
//! - **One query, two surfaces**: a single [`Engine::search`] call returns map
//!   data (clusters or individual markers) and a page of list items computed
//!   from the same filtered set, with one authoritative `total`
//! - **Aggregate hierarchy**: geohash cells at precomputed levels carrying
//!   per-subcategory counts, price stats and centroids
//! - **Filter-exact clusters**: precomputed aggregates where they are exact,
//!   live aggregation elsewhere, so cluster counts never exceed `total`
//! - **Live writes**: listings can be upserted and removed while serving;
//!   aggregates are rebuilt out of band and swapped atomically
//!
//! ```rust
//! use tilescope::prelude::*;
//!
//! let engine = Engine::builder()
//!     .listings([
//!         Listing::new("lx-1", 38.72, -9.14, 320_000.0, ListingType::Sale, "apartment"),
//!         Listing::new("lx-2", 38.74, -9.15, 1_400.0, ListingType::Rent, "apartment"),
//!         Listing::new("op-1", 41.15, -8.61, 210_000.0, ListingType::Sale, "house"),
//!     ])
//!     .build()?;
//!
//! // Wide view of Portugal: clustered.
//! let portugal = Viewport::from_bounds(Bounds::new(42.2, 36.9, -6.1, -9.6), 6.0);
//! let result = engine.search(&SearchRequest::new(portugal, Filters::new()))?;
//! assert_eq!(result.mode, DisplayMode::Clusters);
//! assert_eq!(result.total, 3);
//!
//! // Street-level view of Lisbon, sales only: individual markers.
//! let lisbon = Viewport::from_bounds(Bounds::new(38.75, 38.70, -9.10, -9.20), 16.0);
//! let sales = Filters::new().with_listing_type(ListingType::Sale);
//! let result = engine.search(&SearchRequest::new(lisbon, sales))?;
//! assert_eq!(result.mode, DisplayMode::IndividualItems);
//! assert_eq!(result.list_items[0].id, "lx-1");
//! # Ok::<(), tilescope::TilescopeError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;

pub use builder::EngineBuilder;
pub use engine::{Engine, ingest};
pub use error::{ErrorClass, Result, SearchError, TilescopeError};

pub use config::{
    Bounds, Cluster, ClusterSource, Config, DisplayMode, Filters, IndexStats, LatLng, ListItem,
    Listing, ListingType, MapData, SearchMeta, SearchRequest, SearchResult, SortOrder,
    SpatialIndexNode, SubcategoryStats, Viewport,
};

pub use compute::zoom::{Resolution, ZoomResolver};

#[cfg(feature = "geojson")]
pub use compute::geojson;
pub use compute::validation;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{Engine, EngineBuilder, Result, SearchError, TilescopeError};

    pub use crate::{
        Bounds, Cluster, Config, DisplayMode, Filters, ListItem, Listing, ListingType, MapData,
        SearchRequest, SearchResult, SortOrder, Viewport,
    };

    pub use crate::ZoomResolver;
}
