//! Async driver for the coordinator.
//!
//! One tokio task per map instance owns the [`Coordinator`] and its store.
//! UI events arrive over an mpsc channel; committed snapshots are published on
//! a watch channel. Searches run on their own tasks and report back tagged
//! with their sequence number.

use super::{Coordinator, CoordinatorConfig, Effect, Ticket};
use crate::backend::SearchBackend;
use crate::error::{ClientError, Result};
use crate::store::StoreSnapshot;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tilescope_types::error::SearchError;
use tilescope_types::filter::{Filters, SortOrder};
use tilescope_types::result::SearchResult;
use tilescope_types::viewport::Viewport;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ViewportSettled(Viewport),
    FiltersChanged(Filters),
    PageRequested(u32),
    SortChanged(SortOrder),
    Retry,
    DismissError,
    /// Navigation away: clear results, input and selection.
    Reset,
    Select(Option<String>),
    Hover(Option<String>),
}

type Response = (u64, std::result::Result<SearchResult, SearchError>);

/// A running map session.
pub struct MapSession {
    events: mpsc::Sender<SessionEvent>,
    snapshots: watch::Receiver<Arc<StoreSnapshot>>,
    task: JoinHandle<()>,
}

impl MapSession {
    /// Start the driver task on the current tokio runtime.
    pub fn spawn<B: SearchBackend>(backend: B, config: CoordinatorConfig) -> Self {
        let coordinator = Coordinator::new(config);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(coordinator.store().snapshot());
        let task = tokio::spawn(run(Arc::new(backend), coordinator, events_rx, snapshot_tx));
        Self {
            events: events_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    pub async fn send(&self, event: SessionEvent) -> Result<()> {
        self.events.send(event).await.map_err(|_| ClientError::Closed)
    }

    pub async fn viewport_settled(&self, viewport: Viewport) -> Result<()> {
        self.send(SessionEvent::ViewportSettled(viewport)).await
    }

    pub async fn filters_changed(&self, filters: Filters) -> Result<()> {
        self.send(SessionEvent::FiltersChanged(filters)).await
    }

    pub async fn page_requested(&self, page: u32) -> Result<()> {
        self.send(SessionEvent::PageRequested(page)).await
    }

    pub async fn sort_changed(&self, sort: SortOrder) -> Result<()> {
        self.send(SessionEvent::SortChanged(sort)).await
    }

    pub async fn retry(&self) -> Result<()> {
        self.send(SessionEvent::Retry).await
    }

    pub async fn dismiss_error(&self) -> Result<()> {
        self.send(SessionEvent::DismissError).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(SessionEvent::Reset).await
    }

    pub async fn select(&self, id: Option<String>) -> Result<()> {
        self.send(SessionEvent::Select(id)).await
    }

    pub async fn hover(&self, id: Option<String>) -> Result<()> {
        self.send(SessionEvent::Hover(id)).await
    }

    /// A new receiver for store versions, for any number of UI readers.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.snapshots.clone()
    }

    /// Latest published version.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Stop the driver, aborting any in-flight search.
    pub async fn shutdown(self) {
        drop(self.events);
        if let Err(e) = self.task.await {
            warn!("Map session task failed: {}", e);
        }
    }
}

fn dispatch(coordinator: &mut Coordinator, event: SessionEvent) -> Vec<Effect> {
    match event {
        SessionEvent::ViewportSettled(viewport) => coordinator.on_viewport_settled(viewport),
        SessionEvent::FiltersChanged(filters) => coordinator.on_filters_changed(filters),
        SessionEvent::PageRequested(page) => coordinator.on_page_requested(page),
        SessionEvent::SortChanged(sort) => coordinator.on_sort_changed(sort),
        SessionEvent::Retry => coordinator.retry(),
        SessionEvent::DismissError => {
            coordinator.store_mut().dismiss_error();
            Vec::new()
        }
        SessionEvent::Reset => coordinator.reset(),
        SessionEvent::Select(id) => {
            coordinator.store_mut().select(id);
            Vec::new()
        }
        SessionEvent::Hover(id) => {
            coordinator.store_mut().hover(id);
            Vec::new()
        }
    }
}

fn spawn_search<B: SearchBackend>(
    backend: &Arc<B>,
    ticket: Ticket,
    timeout: Duration,
    responses: &mpsc::UnboundedSender<Response>,
) -> JoinHandle<()> {
    let backend = backend.clone();
    let responses = responses.clone();
    tokio::spawn(async move {
        let Ticket { seq, request } = ticket;
        let result = match tokio::time::timeout(timeout, backend.search(request)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(e.into_search_error()),
            Err(_) => Err(SearchError::Timeout),
        };
        // The session may already be gone.
        let _ = responses.send((seq, result));
    })
}

async fn run<B: SearchBackend>(
    backend: Arc<B>,
    mut coordinator: Coordinator,
    mut events: mpsc::Receiver<SessionEvent>,
    publish: watch::Sender<Arc<StoreSnapshot>>,
) {
    let (responses_tx, mut responses) = mpsc::unbounded_channel::<Response>();
    let mut in_flight: Option<(u64, JoinHandle<()>)> = None;
    let mut debounce = pin!(tokio::time::sleep(Duration::ZERO));
    let mut debounce_armed = false;
    let timeout = coordinator.config().request_timeout;

    loop {
        let effects = tokio::select! {
            event = events.recv() => match event {
                Some(event) => dispatch(&mut coordinator, event),
                None => break,
            },
            Some((seq, result)) = responses.recv() => {
                if in_flight.as_ref().is_some_and(|(s, _)| *s == seq) {
                    in_flight = None;
                }
                coordinator.on_response(seq, result);
                Vec::new()
            }
            () = &mut debounce, if debounce_armed => {
                debounce_armed = false;
                coordinator.debounce_elapsed()
            }
        };

        for effect in effects {
            match effect {
                Effect::Cancel(seq) => {
                    if let Some((s, handle)) = in_flight.take() {
                        debug!("Aborting superseded request {}", s);
                        handle.abort();
                    } else {
                        debug!("Request {} already finished", seq);
                    }
                }
                Effect::Debounce(delay) => {
                    debounce.as_mut().reset(Instant::now() + delay);
                    debounce_armed = true;
                }
                Effect::Issue(ticket) => {
                    let seq = ticket.seq;
                    let handle = spawn_search(&backend, ticket, timeout, &responses_tx);
                    in_flight = Some((seq, handle));
                }
            }
        }

        let snapshot = coordinator.store().snapshot();
        publish.send_if_modified(|current| {
            if current.version == snapshot.version {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    if let Some((seq, handle)) = in_flight {
        debug!("Session closed with request {} in flight", seq);
        handle.abort();
    }
}
