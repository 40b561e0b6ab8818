//! # tilescope-types
//!
//! Value types shared by the tilescope search engine, its server and its
//! clients:
//!
//! - **Query inputs**: [`viewport::Viewport`], [`bbox::Bounds`], [`filter::Filters`],
//!   [`result::SearchRequest`]
//! - **Indexed data**: [`listing::Listing`], [`node::SpatialIndexNode`]
//! - **Outputs**: [`result::SearchResult`], [`result::Cluster`], [`listing::ListItem`]
//! - **Errors**: [`error::SearchError`]
//!
//! Every type is serializable with Serde; any transport must preserve them
//! field for field.
//!
//! ## Examples
//!
//! ```rust
//! use tilescope_types::bbox::Bounds;
//! use tilescope_types::filter::{Filters, ListingType};
//! use tilescope_types::result::SearchRequest;
//! use tilescope_types::viewport::Viewport;
//!
//! let porto = Viewport::from_bounds(Bounds::new(41.19, 41.13, -8.57, -8.69), 13.0);
//! let filters = Filters::new().with_listing_type(ListingType::Rent);
//! let request = SearchRequest::new(porto, filters).page(1, 25);
//! assert_eq!(request.page_size, 25);
//! ```

pub mod bbox;
pub mod error;
pub mod filter;
pub mod listing;
pub mod node;
pub mod result;
pub mod stats;
pub mod viewport;
