//! Protocol definitions for tilescope RPC
//!
//! The service trait exchanged between server and clients. Request and
//! response types are the shared `tilescope-types` wire types, so every
//! transport preserves them field for field.

use tilescope_types::error::SearchError;
use tilescope_types::listing::Listing;
use tilescope_types::result::{SearchRequest, SearchResult};
use tilescope_types::stats::IndexStats;

#[tarpc::service]
pub trait TilescopeService {
    /// Unified viewport search.
    async fn search(request: SearchRequest) -> Result<SearchResult, SearchError>;

    /// Queue an insert-or-replace of a listing.
    async fn upsert_listing(listing: Listing) -> Result<(), String>;

    /// Queue the removal of a listing.
    async fn remove_listing(id: String) -> Result<(), String>;

    async fn get_listing(id: String) -> Result<Option<Listing>, String>;

    /// Rebuild the aggregate hierarchy after every queued write has applied.
    async fn rebuild_index() -> Result<IndexStats, String>;

    async fn stats() -> IndexStats;
}
