// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use discro::Subscriber;
use songsearch_core::{Filters, ResultItem, util::string::normalize_search};
use thiserror::Error;
use tokio::{task::JoinHandle, time::Instant};

use crate::{
    Environment, Observable,
    database::{Database, SearchResponse},
    lock,
    page::SearchId,
    telemetry::SearchTelemetry,
};

pub mod pager;
pub use self::pager::{DEFAULT_SCROLL_LIMIT, Pager, PagerSummary, RequestedItems};

pub mod store;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The underlying data has changed since the query was built.
    #[error("stale query")]
    StaleQuery,

    /// Infinite scrolling has reached its limit.
    #[error("cannot scroll")]
    CannotScroll,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

pub type SearchResult<T> = Result<T, SearchError>;

/// What happened to the results of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The song list has been updated.
    Applied,

    /// Another search has become active in the meantime.
    Inactive,

    /// No rows at a non-zero offset. The results have been discarded.
    Overshoot,

    /// The pager refused to move. Nothing has been queried.
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPhase {
    #[default]
    Idle,
    Running,
    Resolved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchState {
    pub phase: SearchPhase,
    pub infinite_scroll: bool,
}

impl SearchState {
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.phase, SearchPhase::Running)
    }
}

pub type SearchStateSubscriber = Subscriber<SearchState>;

struct QueryState<D: Database> {
    filters: Filters,
    validity: D::Validity,
    prepared: Option<Arc<D::PreparedQuery>>,
    // Incremented on every rebuild
    generation: u64,
}

impl<D: Database> QueryState<D> {
    fn new(filters: Filters, validity: D::Validity, generation: u64) -> Self {
        Self {
            filters,
            validity,
            prepared: None,
            generation,
        }
    }
}

#[derive(Debug, Default)]
struct RunTimings {
    elapsed: Option<Duration>,
    meta_elapsed: Option<Duration>,
}

/// A single logical query of a page.
///
/// Built from a snapshot of the filters. Only the search that is
/// currently active on the [`Page`](crate::page::Page) may update
/// the song list. Results of superseded searches are computed but
/// never applied.
#[allow(missing_debug_implementations)]
pub struct DbSearch<D: Database> {
    id: SearchId,
    env: Environment<D>,
    query: Mutex<QueryState<D>>,
    pager: Mutex<Pager>,
    state: Observable<SearchState>,
    pending_total: Mutex<Option<JoinHandle<()>>>,
}

impl<D: Database> DbSearch<D> {
    #[must_use]
    pub fn new(env: Environment<D>) -> Arc<Self> {
        let filters = env.filters().snapshot();
        let validity = env.db().query_validity();
        let pager = env.settings().new_pager();
        let id = SearchId::next();
        log::debug!("Created search {id}: {filters:?}");
        Arc::new(Self {
            id,
            env,
            query: Mutex::new(QueryState::new(filters, validity, 0)),
            pager: Mutex::new(pager),
            state: Default::default(),
            pending_total: Default::default(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> SearchId {
        self.id
    }

    #[must_use]
    pub fn env(&self) -> &Environment<D> {
        &self.env
    }

    /// The filters the query has been built from.
    #[must_use]
    pub fn filters(&self) -> Filters {
        lock(&self.query).filters.clone()
    }

    #[must_use]
    pub fn pager(&self) -> PagerSummary {
        lock(&self.pager).summary()
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        *self.state.read()
    }

    #[must_use]
    pub fn subscribe_state(&self) -> SearchStateSubscriber {
        self.state.subscribe_changed()
    }

    /// Check if this search would produce the same results.
    #[must_use]
    pub fn is_equal(&self, db: &D, filters: &Filters) -> bool {
        let query = lock(&self.query);
        query.validity == db.query_validity() && query.filters == *filters
    }

    #[must_use]
    pub fn is_query_valid(&self) -> bool {
        lock(&self.query).validity == self.env.db().query_validity()
    }

    /// Activate this search and load the first page.
    pub async fn run(self: &Arc<Self>) -> SearchResult<RunOutcome> {
        self.env.page().activate(self.id);
        self.load_first_page().await
    }

    /// Load the first page without activating this search.
    ///
    /// The results are only applied if the search has been activated
    /// before and not been superseded since.
    pub(crate) async fn load_first_page(self: &Arc<Self>) -> SearchResult<RunOutcome> {
        self.run_with(true, false).await
    }

    /// Move by `pages` pages, backwards if negative.
    pub async fn change_page(self: &Arc<Self>, pages: isize) -> SearchResult<RunOutcome> {
        if !self.is_query_valid() {
            return self.rebuild().await;
        }
        let moved = lock(&self.pager).change_page(pages, false);
        if !moved {
            log::debug!("Search {id}: cannot move by {pages} page(s)", id = self.id);
            return Ok(RunOutcome::Unchanged);
        }
        self.run_with(false, false).await
    }

    /// Append the next page to the song list.
    pub async fn infinite_scroll(self: &Arc<Self>) -> SearchResult<RunOutcome> {
        if !self.is_query_valid() {
            return self.rebuild().await;
        }
        let moved = lock(&self.pager).change_page(1, true);
        if !moved {
            return Err(SearchError::CannotScroll);
        }
        self.run_with(false, true).await
    }

    /// Build the query from scratch after the data has changed.
    async fn rebuild(self: &Arc<Self>) -> SearchResult<RunOutcome> {
        let filters = self.env.filters().snapshot();
        let validity = self.env.db().query_validity();
        log::info!("Rebuilding search {id} with validity {validity:?}", id = self.id);
        {
            let mut query = lock(&self.query);
            let generation = query.generation + 1;
            *query = QueryState::new(filters, validity, generation);
        }
        *lock(&self.pager) = self.env.settings().new_pager();
        self.load_first_page().await
    }

    async fn run_with(
        self: &Arc<Self>,
        fresh_total: bool,
        infinite_scroll: bool,
    ) -> SearchResult<RunOutcome> {
        let filters = self.filters();
        let requested = lock(&self.pager).requested_items(infinite_scroll);
        let mut timings = RunTimings::default();
        let result = self.execute(requested, fresh_total, &mut timings).await;
        match &result {
            Ok(outcome) => {
                log::debug!("Search {id} finished: {outcome:?}", id = self.id);
            }
            Err(SearchError::Database(err)) => {
                log::warn!("Search {id} failed: {err}", id = self.id);
                self.publish_state(SearchPhase::Resolved, infinite_scroll);
            }
            Err(err) => {
                log::debug!("Search {id} aborted: {err}", id = self.id);
            }
        }
        let RunTimings {
            elapsed,
            meta_elapsed,
        } = timings;
        let telemetry = SearchTelemetry::new(&filters, requested)
            .with_elapsed(elapsed, meta_elapsed)
            .with_failed(matches!(result, Err(SearchError::Database(_))));
        self.env.telemetry().submit(telemetry);
        result
    }

    async fn execute(
        self: &Arc<Self>,
        requested: RequestedItems,
        fresh_total: bool,
        timings: &mut RunTimings,
    ) -> SearchResult<RunOutcome> {
        let db = self.env.db();
        let (filters, validity, generation) = {
            let query = lock(&self.query);
            (
                query.filters.clone(),
                query.validity.clone(),
                query.generation,
            )
        };
        if db.query_validity() != validity {
            return Err(SearchError::StaleQuery);
        }
        self.cancel_pending_total();
        self.publish_state(SearchPhase::Running, requested.infinite_scroll);

        let search = normalize_search(&filters.search);
        let prepared = self.prepared_query(&filters, &search, generation).await?;
        let with_meta = requested.start == 0
            && !requested.infinite_scroll
            && filters.is_text_search()
            && !filters.is_filtered_by_source_or_album();
        let songs = async {
            let started = Instant::now();
            let response = db.run_search(&prepared, requested).await;
            (response, started.elapsed())
        };
        let meta = async {
            if !with_meta {
                return (Ok(Vec::new()), None);
            }
            let started = Instant::now();
            let meta = db.search_meta(&filters, &search).await;
            (meta, Some(started.elapsed()))
        };
        let ((response, elapsed), (meta, meta_elapsed)) = tokio::join!(songs, meta);
        timings.elapsed = Some(elapsed);
        timings.meta_elapsed = meta_elapsed;
        let SearchResponse { mut data, total } = response?;
        let meta = meta?;
        db.add_timing_stat(elapsed);

        let on_cur_page = data.len();
        if requested.start > 0 && on_cur_page == 0 {
            log::debug!(
                "Search {id}: no results at offset {start}",
                id = self.id,
                start = requested.start
            );
            self.publish_state(SearchPhase::Resolved, requested.infinite_scroll);
            return Ok(RunOutcome::Overshoot);
        }
        if !self.env.page().is_active(self.id) {
            self.publish_state(SearchPhase::Resolved, requested.infinite_scroll);
            return Ok(RunOutcome::Inactive);
        }

        let (summary, total_known) = {
            let mut pager = lock(&self.pager);
            data.truncate(pager.page_size());
            pager.update(requested, on_cur_page);
            if let Some(total) = total {
                pager.set_total(total);
            }
            (pager.summary(), pager.total().is_some())
        };
        let items = meta
            .into_iter()
            .map(ResultItem::from)
            .chain(data.into_iter().map(ResultItem::from))
            .collect();
        let applied = self
            .env
            .page()
            .apply_results(self.id, items, requested, summary);
        self.publish_state(SearchPhase::Resolved, requested.infinite_scroll);
        if !applied {
            return Ok(RunOutcome::Inactive);
        }
        if fresh_total && !total_known {
            self.schedule_total(prepared, elapsed);
        }
        Ok(RunOutcome::Applied)
    }

    async fn prepared_query(
        &self,
        filters: &Filters,
        search: &str,
        generation: u64,
    ) -> anyhow::Result<Arc<D::PreparedQuery>> {
        {
            let query = lock(&self.query);
            if query.generation == generation
                && let Some(prepared) = &query.prepared
            {
                return Ok(Arc::clone(prepared));
            }
        }
        let prepared = Arc::new(self.env.db().prepare_query(filters, search).await?);
        let mut query = lock(&self.query);
        if query.generation == generation {
            query.prepared = Some(Arc::clone(&prepared));
        }
        Ok(prepared)
    }

    fn schedule_total(self: &Arc<Self>, prepared: Arc<D::PreparedQuery>, elapsed: Duration) {
        let settings = self.env.settings();
        let delay = (elapsed > settings.slow_query_threshold()
            && !self.env.db().instant_total_query())
        .then(|| settings.deferred_total_delay());
        log::debug!(
            "Search {id}: counting results after {delay:?}",
            id = self.id
        );
        let search = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let Some(search) = search.upgrade() else {
                // Search has been dropped.
                return;
            };
            match search.env.db().get_total(&prepared).await {
                Ok(total) => search.apply_total(total),
                Err(err) => {
                    log::warn!("Failed to count results: {err}");
                }
            }
        });
        if let Some(previous) = lock(&self.pending_total).replace(task) {
            previous.abort();
        }
    }

    fn cancel_pending_total(&self) {
        if let Some(task) = lock(&self.pending_total).take() {
            log::debug!("Search {id}: cancelling pending count", id = self.id);
            task.abort();
        }
    }

    fn apply_total(&self, total: usize) {
        if !self.env.page().is_active(self.id) {
            return;
        }
        let summary = {
            let mut pager = lock(&self.pager);
            pager.set_total(total);
            pager.summary()
        };
        if self.env.page().apply_pager(self.id, summary) {
            log::debug!("Search {id}: {total} result(s)", id = self.id);
        }
    }

    fn publish_state(&self, phase: SearchPhase, infinite_scroll: bool) {
        let next_state = SearchState {
            phase,
            infinite_scroll,
        };
        self.state.modify(|state| {
            if *state == next_state {
                return false;
            }
            *state = next_state;
            true
        });
    }
}

impl<D: Database> Drop for DbSearch<D> {
    fn drop(&mut self) {
        let pending_total = self
            .pending_total
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending_total.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests;
