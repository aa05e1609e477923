//! Search-paginate-cache controller.
//!
//! Holds the applied filter set, the page cursor and the accumulated result
//! list. Filter edits go to a draft and are applied after a quiet interval;
//! applying bumps the request generation so that responses to older
//! requests are dropped instead of being merged into the new list.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use roomie_core::config::SearchConfig;
use roomie_core::error::{AppError, ErrorKind};
use roomie_core::result::AppResult;
use roomie_core::traits::CacheStore;
use roomie_core::types::{FilterKey, PageRequest, ProfileSummary, SearchFilters};

use crate::cache::{CacheStats, PageCache};
use crate::client::ProfileSearchApi;
use crate::keys;

/// Shown when the response had an unexpected shape.
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response format";

/// Shown for every other fetch failure.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load posts";

/// User-visible message for a fetch error.
pub fn user_message(err: &AppError) -> &'static str {
    if err.is(ErrorKind::Serialization) {
        INVALID_RESPONSE_MESSAGE
    } else {
        LOAD_FAILED_MESSAGE
    }
}

/// Observable controller state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchSnapshot {
    /// Applied filters.
    pub filters: SearchFilters,
    /// Accumulated results.
    pub posts: Vec<ProfileSummary>,
    /// Current page cursor (1-based).
    pub page: u32,
    /// Whether another page may exist.
    pub has_more: bool,
    /// Whether a fetch for the current generation is running.
    pub is_loading: bool,
    /// Last user-visible error.
    pub error: Option<String>,
}

/// Result of one fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetched from the network; carries the page length.
    Network(usize),
    /// Served from the cache; carries the page length.
    Cache(usize),
    /// Another fetch is already running; nothing was done.
    InFlight,
    /// No more pages; nothing was done.
    Exhausted,
    /// Filters changed while the request was running; the response was dropped.
    Stale,
    /// The fetch failed; carries the user-visible message.
    Failed(String),
}

#[derive(Debug)]
struct State {
    draft: SearchFilters,
    filters: SearchFilters,
    page: u32,
    posts: Vec<ProfileSummary>,
    has_more: bool,
    generation: u64,
    in_flight: Option<u64>,
    /// The page under the cursor failed; the next `load_more` retries it.
    failed: bool,
    error: Option<String>,
}

impl State {
    fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            filters: self.filters.clone(),
            posts: self.posts.clone(),
            page: self.page,
            has_more: self.has_more,
            is_loading: self.in_flight == Some(self.generation),
            error: self.error.clone(),
        }
    }

    /// Start over at page one under a new generation.
    fn reset(&mut self) {
        self.generation += 1;
        self.page = 1;
        self.posts.clear();
        self.has_more = true;
        self.failed = false;
        self.error = None;
    }
}

#[derive(Debug)]
struct Inner {
    api: Arc<dyn ProfileSearchApi>,
    store: Arc<dyn CacheStore>,
    cache: tokio::sync::Mutex<PageCache>,
    state: Mutex<State>,
    pending: Mutex<Option<JoinHandle<()>>>,
    snapshot_tx: watch::Sender<SearchSnapshot>,
    page_size: usize,
    debounce: Duration,
}

/// Paginated profile search with a debounced filter draft and a page cache.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct SearchController {
    inner: Arc<Inner>,
}

impl SearchController {
    /// Create a controller, loading persisted cache state from `store`.
    pub async fn open(
        config: &SearchConfig,
        api: Arc<dyn ProfileSearchApi>,
        store: Arc<dyn CacheStore>,
        mut cache: PageCache,
    ) -> Self {
        let loaded = cache.load(store.as_ref()).await;
        debug!(entries = loaded, "Search controller opened");

        let state = State {
            draft: SearchFilters::default(),
            filters: SearchFilters::default(),
            page: 1,
            posts: Vec::new(),
            has_more: true,
            generation: 0,
            in_flight: None,
            failed: false,
            error: None,
        };
        let (snapshot_tx, _) = watch::channel(state.snapshot());

        Self {
            inner: Arc::new(Inner {
                api,
                store,
                cache: tokio::sync::Mutex::new(cache),
                state: Mutex::new(state),
                pending: Mutex::new(None),
                snapshot_tx,
                page_size: config.page_size.max(1),
                debounce: config.debounce(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &State) {
        self.inner.snapshot_tx.send_replace(state.snapshot());
    }

    /// Current state.
    pub fn snapshot(&self) -> SearchSnapshot {
        self.state().snapshot()
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Filters being edited, not yet applied.
    pub fn draft(&self) -> SearchFilters {
        self.state().draft.clone()
    }

    /// Edit one draft field and (re)start the debounce timer.
    pub fn update_filter(&self, key: FilterKey, value: &str) -> AppResult<()> {
        self.state().draft.set(key, value)?;
        self.schedule_apply();
        Ok(())
    }

    /// Replace the whole draft and (re)start the debounce timer.
    pub fn set_filters(&self, filters: SearchFilters) {
        self.state().draft = filters;
        self.schedule_apply();
    }

    fn schedule_apply(&self) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.debounce;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                let controller = SearchController { inner };
                controller.apply_filters().await;
            }
        });

        let mut pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    /// Apply the draft immediately, cancelling any pending debounce.
    pub async fn apply_filters_now(&self) -> FetchOutcome {
        self.cancel_pending();
        self.apply_filters().await
    }

    /// Apply the draft and reload it from the network in a single request.
    pub async fn apply_and_refresh(&self) -> FetchOutcome {
        self.cancel_pending();
        {
            let mut state = self.state();
            state.filters = state.draft.clone();
        }
        self.refresh_data().await
    }

    fn cancel_pending(&self) {
        let pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = pending {
            task.abort();
        }
    }

    async fn apply_filters(&self) -> FetchOutcome {
        {
            let mut state = self.state();
            state.filters = state.draft.clone();
            state.reset();
            info!(generation = state.generation, "Filters applied");
            self.publish(&state);
        }
        self.fetch_page().await
    }

    /// Fetch the page under the cursor, from cache when fresh.
    pub async fn fetch_page(&self) -> FetchOutcome {
        let (generation, filters, page) = {
            let mut state = self.state();
            if state.in_flight == Some(state.generation) {
                return FetchOutcome::InFlight;
            }
            if !state.has_more {
                return FetchOutcome::Exhausted;
            }
            state.in_flight = Some(state.generation);
            state.error = None;
            self.publish(&state);
            (state.generation, state.filters.clone(), state.page)
        };

        let request = PageRequest::new(page, self.inner.page_size);
        let key = keys::page_key(&filters, page);
        let result = self.load(&key, &filters, request, generation).await;

        let mut state = self.state();
        if state.in_flight == Some(generation) {
            state.in_flight = None;
        }
        if state.generation != generation {
            debug!(key = %key, generation, "Dropping response for superseded filters");
            return FetchOutcome::Stale;
        }

        let outcome = match result {
            Ok((posts, from_cache)) => {
                let count = posts.len();
                if page == 1 {
                    state.posts = posts;
                } else {
                    state.posts.extend(posts);
                }
                state.has_more = !request.is_last_page(count);
                state.failed = false;
                if from_cache {
                    FetchOutcome::Cache(count)
                } else {
                    FetchOutcome::Network(count)
                }
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Error fetching posts");
                let message = user_message(&e).to_string();
                state.error = Some(message.clone());
                state.failed = true;
                FetchOutcome::Failed(message)
            }
        };
        self.publish(&state);
        outcome
    }

    async fn load(
        &self,
        key: &str,
        filters: &SearchFilters,
        request: PageRequest,
        generation: u64,
    ) -> AppResult<(Vec<ProfileSummary>, bool)> {
        if let Some(posts) = self.inner.cache.lock().await.get(key) {
            debug!(key, "Serving page from cache");
            return Ok((posts, true));
        }

        let posts = self.inner.api.search(filters, request).await?;

        let mut cache = self.inner.cache.lock().await;
        // a reset or refresh since the request started makes this data untrustworthy
        if self.state().generation != generation {
            debug!(key, generation, "Not caching response for superseded generation");
            return Ok((posts, false));
        }
        cache.insert(key.to_string(), posts.clone());
        if let Err(e) = cache.persist(self.inner.store.as_ref()).await {
            warn!(error = %e, "Failed to persist search cache");
        }
        Ok((posts, false))
    }

    /// Advance to the next page and fetch it. After a failure the same page
    /// is retried instead.
    pub async fn load_more(&self) -> FetchOutcome {
        {
            let mut state = self.state();
            if state.in_flight == Some(state.generation) {
                return FetchOutcome::InFlight;
            }
            if !state.has_more {
                return FetchOutcome::Exhausted;
            }
            if !state.failed {
                state.page += 1;
            }
            self.publish(&state);
        }
        self.fetch_page().await
    }

    /// Drop cached pages of the applied filters and start again from page one.
    pub async fn refresh_data(&self) -> FetchOutcome {
        // bump the generation first so responses already in flight are not cached
        let filters = {
            let mut state = self.state();
            state.reset();
            self.publish(&state);
            state.filters.clone()
        };
        {
            let mut cache = self.inner.cache.lock().await;
            let removed = cache.invalidate_prefix(&keys::filter_prefix(&filters));
            debug!(removed, "Invalidated cached pages");
            if let Err(e) = cache.persist(self.inner.store.as_ref()).await {
                warn!(error = %e, "Failed to persist search cache");
            }
        }
        self.fetch_page().await
    }

    /// Cache occupancy.
    pub async fn cache_stats(&self) -> CacheStats {
        self.inner.cache.lock().await.stats()
    }

    /// Empty the cache and its persisted copy.
    pub async fn clear_cache(&self) -> AppResult<()> {
        let mut cache = self.inner.cache.lock().await;
        cache.clear();
        cache.persist(self.inner.store.as_ref()).await
    }
}
