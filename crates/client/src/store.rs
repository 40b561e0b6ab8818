//! Client result store
//!
//! Single source of truth for one map instance. Every mutation produces a new
//! [`StoreSnapshot`] version; readers hold `Arc`s to fully-formed versions and
//! never observe a half-applied update. Map data, list data and `total` live
//! together inside one [`SearchResult`] and only change through
//! [`ResultStore::set_unified_result`].

use std::sync::Arc;
use tilescope_types::error::{ErrorClass, SearchError};
use tilescope_types::filter::{Filters, SortOrder};
use tilescope_types::listing::ListItem;
use tilescope_types::result::{DisplayMode, MapData, SearchResult};
use tilescope_types::viewport::Viewport;
use tracing::debug;

/// A surfaced search failure.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreError {
    pub error: SearchError,
    /// Caller bugs persist until the input changes; transient errors can be
    /// dismissed.
    pub persistent: bool,
}

/// One immutable version of the client state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub version: u64,
    pub viewport: Option<Viewport>,
    pub filters: Filters,
    pub page: u32,
    pub page_size: u32,
    pub sort: SortOrder,
    /// Last committed result; kept while a newer request is pending.
    pub result: Option<Arc<SearchResult>>,
    /// Sequence number of the request that produced `result`.
    pub committed_seq: u64,
    pub loading: bool,
    pub error: Option<StoreError>,
    pub selected_id: Option<String>,
    pub hovered_id: Option<String>,
}

impl StoreSnapshot {
    fn new(page_size: u32, sort: SortOrder) -> Self {
        Self {
            version: 0,
            viewport: None,
            filters: Filters::default(),
            page: 1,
            page_size,
            sort,
            result: None,
            committed_seq: 0,
            loading: false,
            error: None,
            selected_id: None,
            hovered_id: None,
        }
    }

    pub fn mode(&self) -> Option<DisplayMode> {
        self.result.as_ref().map(|r| r.mode)
    }

    pub fn map_data(&self) -> Option<&MapData> {
        self.result.as_ref().map(|r| &r.map_data)
    }

    pub fn list_items(&self) -> &[ListItem] {
        self.result
            .as_ref()
            .map(|r| r.list_items.as_slice())
            .unwrap_or_default()
    }

    /// The count shown by both the map badge and the list pager.
    pub fn total(&self) -> u64 {
        self.result.as_ref().map_or(0, |r| r.total)
    }

    pub fn total_pages(&self) -> u32 {
        self.result.as_ref().map_or(0, |r| r.total_pages)
    }

    pub fn has_data(&self) -> bool {
        self.result.is_some()
    }
}

/// Single-writer store. Owned by the coordinator; readers get snapshots.
#[derive(Debug, Clone)]
pub struct ResultStore {
    current: Arc<StoreSnapshot>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(20, SortOrder::default())
    }
}

impl ResultStore {
    pub fn new(page_size: u32, sort: SortOrder) -> Self {
        Self {
            current: Arc::new(StoreSnapshot::new(page_size, sort)),
        }
    }

    /// Current version. Cheap to clone and safe to hand to any reader.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.current.clone()
    }

    fn update(&mut self, f: impl FnOnce(&mut StoreSnapshot)) {
        let next = Arc::make_mut(&mut self.current);
        f(next);
        next.version += 1;
    }

    /// Commit a search result, replacing map data, list data and totals at once.
    ///
    /// Results older than the committed one are rejected; returns whether the
    /// result was committed.
    pub fn set_unified_result(&mut self, seq: u64, result: SearchResult) -> bool {
        if seq <= self.current.committed_seq {
            debug!(
                "Rejecting result for request {} (committed {})",
                seq, self.current.committed_seq
            );
            return false;
        }
        self.update(|s| {
            s.result = Some(Arc::new(result));
            s.committed_seq = seq;
            s.loading = false;
            s.error = None;
        });
        true
    }

    /// Record the current viewport. Returns whether the searched area changed,
    /// in which case the page resets to 1.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        let changed = self
            .current
            .viewport
            .is_none_or(|current| current.differs_from(&viewport));
        self.update(|s| {
            s.viewport = Some(viewport);
            if changed {
                s.page = 1;
                clear_persistent_error(s);
            }
        });
        changed
    }

    /// Replace the filters. Returns whether they changed; a change resets the
    /// page to 1.
    pub fn set_filters(&mut self, filters: Filters) -> bool {
        if self.current.filters == filters {
            return false;
        }
        self.update(|s| {
            s.filters = filters;
            s.page = 1;
            clear_persistent_error(s);
        });
        true
    }

    pub fn set_page(&mut self, page: u32) {
        self.update(|s| s.page = page);
    }

    /// Change the list ordering. Resets the page to 1.
    pub fn set_sort(&mut self, sort: SortOrder) -> bool {
        if self.current.sort == sort {
            return false;
        }
        self.update(|s| {
            s.sort = sort;
            s.page = 1;
        });
        true
    }

    pub fn set_loading(&mut self, loading: bool) {
        if self.current.loading != loading {
            self.update(|s| s.loading = loading);
        }
    }

    /// Surface a failure. The previous result, if any, stays visible.
    ///
    /// Internal errors such as cancellation are never shown.
    pub fn set_error(&mut self, error: SearchError) {
        let persistent = match error.class() {
            ErrorClass::Internal => {
                self.set_loading(false);
                return;
            }
            ErrorClass::CallerBug => true,
            ErrorClass::Transient => false,
        };
        self.update(|s| {
            s.loading = false;
            s.error = Some(StoreError { error, persistent });
        });
    }

    /// Dismiss a transient error banner. Persistent errors stay.
    pub fn dismiss_error(&mut self) -> bool {
        match &self.current.error {
            Some(err) if !err.persistent => {
                self.update(|s| s.error = None);
                true
            }
            _ => false,
        }
    }

    /// Selection is independent of result updates.
    pub fn select(&mut self, id: Option<String>) {
        self.update(|s| s.selected_id = id);
    }

    pub fn hover(&mut self, id: Option<String>) {
        self.update(|s| s.hovered_id = id);
    }

    /// Back to defaults, keeping the version counter monotonic.
    pub fn reset(&mut self) {
        let version = self.current.version + 1;
        let mut fresh = StoreSnapshot::new(self.current.page_size, self.current.sort);
        fresh.version = version;
        self.current = Arc::new(fresh);
    }
}

fn clear_persistent_error(s: &mut StoreSnapshot) {
    if s.error.as_ref().is_some_and(|e| e.persistent) {
        s.error = None;
    }
}
