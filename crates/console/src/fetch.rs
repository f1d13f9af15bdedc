//! Fetch orchestration for the geozone listing.
//!
//! Owns pagination, limit, and search-text state; selects between the plain
//! listing and text-search retrieval paths; debounces search input; and
//! discards responses that belong to superseded requests. The governing
//! discipline is "last request wins": every request is tagged with an
//! issuance number and a result is applied only if no newer request has been
//! issued since.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use client::{ApiError, GeozoneApi};
use domain::models::Geozone;
use shared::pagination::{PageQuery, PageQueryError};

use crate::notify::Notifier;

/// Quiet interval a search-text change must survive before it fetches.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Fetch lifecycle phase of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Fetching,
    Error,
}

/// Errors from refresh operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Query(#[from] PageQueryError),
}

/// Receives the record set each time a fetch result is applied.
///
/// The overlay layer implements this so that the rendered overlays always
/// reflect the most recently completed fetch, never an in-flight one.
pub trait RecordsObserver: Send + Sync {
    fn records_applied(&self, records: &[Geozone]);
}

/// Observer for callers that render nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl RecordsObserver for NullObserver {
    fn records_applied(&self, _records: &[Geozone]) {}
}

#[derive(Debug)]
struct ListState {
    query: PageQuery,
    records: Vec<Geozone>,
    total: u64,
    phase: FetchPhase,
    /// Issuance number of the newest request.
    issued: u64,
}

struct Inner {
    api: Arc<dyn GeozoneApi>,
    observer: Arc<dyn RecordsObserver>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<ListState>,
    debounce: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    async fn refresh(&self) -> Result<(), FetchError> {
        loop {
            let (query, seq) = {
                let mut state = self.lock_state();
                state.phase = FetchPhase::Fetching;
                state.issued += 1;
                (state.query.clone(), state.issued)
            };

            let result = if query.is_search() {
                self.api
                    .search(query.page, query.limit, &query.search_text)
                    .await
            } else {
                self.api.list(query.page, query.limit).await
            };

            match result {
                Ok(page) => {
                    let applied = {
                        let mut state = self.lock_state();
                        if seq != state.issued {
                            debug!(seq, latest = state.issued, "Discarding stale fetch result");
                            None
                        } else {
                            state.records = page.data;
                            state.total = page.total;
                            state.phase = FetchPhase::Idle;
                            let total = state.total;
                            let clamped = state.query.clamp_to_total(total);
                            Some((state.records.clone(), clamped))
                        }
                    };
                    let Some((records, clamped)) = applied else {
                        return Ok(());
                    };
                    self.observer.records_applied(&records);
                    if !clamped {
                        return Ok(());
                    }
                    let page = self.lock_state().query.page;
                    debug!(page, "Page clamped after total change, refetching");
                }
                Err(err) => {
                    // Previous records and total stay in place so the
                    // listing and pagination do not flicker on transient
                    // failures.
                    {
                        let mut state = self.lock_state();
                        if seq == state.issued {
                            state.phase = FetchPhase::Error;
                        }
                    }
                    warn!(error = %err, "Geozone fetch failed");
                    self.notifier
                        .error(&format!("Failed to load geozones: {}", err.user_message()));
                    return Err(err.into());
                }
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ListState> {
        self.state.lock().expect("list state poisoned")
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.debounce.lock().expect("debounce slot poisoned").take() {
            task.abort();
        }
    }
}

/// Coordinates all record retrieval for the listing.
pub struct FetchOrchestrator {
    inner: Arc<Inner>,
}

impl FetchOrchestrator {
    pub fn new(
        api: Arc<dyn GeozoneApi>,
        observer: Arc<dyn RecordsObserver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                observer,
                notifier,
                state: Mutex::new(ListState {
                    query: PageQuery::default(),
                    records: Vec::new(),
                    total: 0,
                    phase: FetchPhase::Idle,
                    issued: 0,
                }),
                debounce: Mutex::new(None),
            }),
        }
    }

    /// Fetches the page described by the current query and applies the
    /// result unless a newer request was issued in the meantime.
    ///
    /// When the applied total pulls the current page back into range, the
    /// clamped page is fetched immediately so the listing never shows a page
    /// past the end.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        self.inner.refresh().await
    }

    /// Moves to the given page and fetches it.
    pub async fn set_page(&self, page: u32) -> Result<(), FetchError> {
        self.inner.lock_state().query.set_page(page)?;
        self.inner.refresh().await
    }

    /// Changes the page size (resetting to page 1) and fetches.
    pub async fn set_limit(&self, limit: u32) -> Result<(), FetchError> {
        self.inner.lock_state().query.set_limit(limit)?;
        self.inner.refresh().await
    }

    /// Records new search text and schedules the debounced fetch.
    ///
    /// The fetch fires only after the text has been quiet for
    /// [`SEARCH_DEBOUNCE`]; a further change within the interval cancels the
    /// pending one, so at most one request is in flight per settled value.
    /// When the timer fires, a page other than 1 is reset first and exactly
    /// one fetch is issued either way.
    pub fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut state = self.inner.lock_state();
            if state.query.search_text == text {
                return;
            }
            state.query.search_text = text;
        }

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            tokio::time::sleep(SEARCH_DEBOUNCE).await;
            {
                let mut state = inner.lock_state();
                if state.query.page != 1 {
                    state.query.page = 1;
                }
            }
            if let Err(err) = inner.refresh().await {
                warn!(error = %err, "Debounced search fetch failed");
            }
        });

        if let Some(previous) = self
            .inner
            .debounce
            .lock()
            .expect("debounce slot poisoned")
            .replace(task)
        {
            previous.abort();
        }
    }

    /// Cancels the pending debounce timer and invalidates in-flight
    /// responses so they can no longer land on a dead state container.
    pub fn shutdown(&self) {
        if let Some(task) = self
            .inner
            .debounce
            .lock()
            .expect("debounce slot poisoned")
            .take()
        {
            task.abort();
        }
        self.inner.lock_state().issued += 1;
    }

    pub fn records(&self) -> Vec<Geozone> {
        self.inner.lock_state().records.clone()
    }

    pub fn total(&self) -> u64 {
        self.inner.lock_state().total
    }

    pub fn total_pages(&self) -> u32 {
        let state = self.inner.lock_state();
        state.query.total_pages(state.total)
    }

    pub fn query(&self) -> PageQuery {
        self.inner.lock_state().query.clone()
    }

    pub fn phase(&self) -> FetchPhase {
        self.inner.lock_state().phase
    }
}
