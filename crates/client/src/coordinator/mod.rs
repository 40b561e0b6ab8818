//! Viewport change coordinator
//!
//! A synchronous state machine: `Idle → Debouncing → InFlight → Idle`. It
//! performs no I/O itself. Each input returns the [`Effect`]s the driver must
//! carry out (arm the debounce timer, abort a request, issue a search), which
//! keeps timing and sequencing decisions testable without a runtime.

mod session;

pub use session::{MapSession, SessionEvent};

use crate::store::ResultStore;
use std::time::Duration;
use tilescope_types::error::SearchError;
use tilescope_types::filter::{Filters, SortOrder};
use tilescope_types::result::{SearchRequest, SearchResult};
use tilescope_types::viewport::Viewport;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Quiet period after the last viewport or filter change.
    pub debounce: Duration,
    /// Deadline for a single search; expiry surfaces `Timeout`.
    pub request_timeout: Duration,
    pub page_size: u32,
    pub sort: SortOrder,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            request_timeout: Duration::from_secs(10),
            page_size: 20,
            sort: SortOrder::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Debouncing,
    InFlight { seq: u64 },
}

/// A search to run, tagged with its issuance order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub seq: u64,
    pub request: SearchRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Stop waiting for request `seq`; its response will be discarded.
    Cancel(u64),
    /// (Re)arm the debounce timer.
    Debounce(Duration),
    Issue(Ticket),
}

pub struct Coordinator {
    config: CoordinatorConfig,
    store: ResultStore,
    phase: Phase,
    last_seq: u64,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        let store = ResultStore::new(config.page_size, config.sort);
        Self {
            config,
            store,
            phase: Phase::Idle,
            last_seq: 0,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ResultStore {
        &mut self.store
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Sequence number of the most recently issued request.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// The map settled on a new viewport.
    pub fn on_viewport_settled(&mut self, viewport: Viewport) -> Vec<Effect> {
        if !self.store.set_viewport(viewport) {
            return Vec::new();
        }
        self.restart_debounce()
    }

    pub fn on_filters_changed(&mut self, filters: Filters) -> Vec<Effect> {
        if !self.store.set_filters(filters) {
            return Vec::new();
        }
        self.restart_debounce()
    }

    /// A discrete page click from the list; issued without debounce.
    pub fn on_page_requested(&mut self, page: u32) -> Vec<Effect> {
        if page == 0 || (page == self.store.snapshot().page && self.phase == Phase::Idle) {
            return Vec::new();
        }
        self.store.set_page(page);
        self.issue_now()
    }

    pub fn on_sort_changed(&mut self, sort: SortOrder) -> Vec<Effect> {
        if !self.store.set_sort(sort) {
            return Vec::new();
        }
        self.issue_now()
    }

    /// Re-run the current query immediately, e.g. after a transient error.
    pub fn retry(&mut self) -> Vec<Effect> {
        self.issue_now()
    }

    /// Navigation away: drop pending work and return the store to defaults.
    pub fn reset(&mut self) -> Vec<Effect> {
        let effects = self.cancel_in_flight().into_iter().collect();
        self.phase = Phase::Idle;
        self.store.reset();
        effects
    }

    pub fn debounce_elapsed(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Debouncing {
            return Vec::new();
        }
        self.issue().into_iter().collect()
    }

    /// A backend answered request `seq`. Returns whether the store changed.
    ///
    /// Only the latest issued request can commit; anything else is stale and
    /// dropped silently.
    pub fn on_response(&mut self, seq: u64, result: Result<SearchResult, SearchError>) -> bool {
        if self.phase != (Phase::InFlight { seq }) {
            debug!("Discarding stale response for request {}", seq);
            return false;
        }
        self.phase = Phase::Idle;
        match result {
            Ok(result) => self.store.set_unified_result(seq, result),
            Err(err) => {
                debug!("Request {} failed: {}", seq, err);
                self.store.set_error(err);
                true
            }
        }
    }

    fn cancel_in_flight(&mut self) -> Option<Effect> {
        match self.phase {
            Phase::InFlight { seq } => {
                self.phase = Phase::Idle;
                self.store.set_loading(false);
                Some(Effect::Cancel(seq))
            }
            _ => None,
        }
    }

    fn restart_debounce(&mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = self.cancel_in_flight().into_iter().collect();
        self.phase = Phase::Debouncing;
        effects.push(Effect::Debounce(self.config.debounce));
        effects
    }

    fn issue_now(&mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = self.cancel_in_flight().into_iter().collect();
        effects.extend(self.issue());
        effects
    }

    fn issue(&mut self) -> Option<Effect> {
        let snapshot = self.store.snapshot();
        let Some(viewport) = snapshot.viewport else {
            self.phase = Phase::Idle;
            return None;
        };
        self.last_seq += 1;
        let seq = self.last_seq;
        self.phase = Phase::InFlight { seq };
        self.store.set_loading(true);

        let request = SearchRequest::new(viewport, snapshot.filters.clone())
            .page(snapshot.page, snapshot.page_size)
            .sort(snapshot.sort);
        debug!("Issuing request {} at zoom {}", seq, viewport.zoom);
        Some(Effect::Issue(Ticket { seq, request }))
    }
}
