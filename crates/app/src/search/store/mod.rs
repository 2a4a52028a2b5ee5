// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{Environment, database::Database, lock};

use super::{DbSearch, RunOutcome, SearchError, SearchResult};

pub mod tasklet;

/// Holds the current search of a page.
///
/// Expected conditions like stale queries or an exhausted infinite
/// scroll are not reported as errors. The corresponding operations
/// return `Ok(None)` instead.
#[allow(missing_debug_implementations)]
pub struct SearchStore<D: Database> {
    env: Environment<D>,
    current: Mutex<Option<Arc<DbSearch<D>>>>,
}

impl<D: Database> SearchStore<D> {
    #[must_use]
    pub fn new(env: Environment<D>) -> Self {
        Self {
            env,
            current: Default::default(),
        }
    }

    #[must_use]
    pub fn env(&self) -> &Environment<D> {
        &self.env
    }

    #[must_use]
    pub fn current(&self) -> Option<Arc<DbSearch<D>>> {
        lock(&self.current).clone()
    }

    /// Search with the current filters.
    ///
    /// Returns `Ok(None)` if the current search already matches
    /// the filters.
    pub async fn search(&self) -> SearchResult<Option<RunOutcome>> {
        let filters = self.env.filters().snapshot();
        let search = {
            let mut current = lock(&self.current);
            if let Some(search) = current.as_ref()
                && search.is_equal(self.env.db(), &filters)
            {
                log::debug!("Search {id} is up to date", id = search.id());
                return Ok(None);
            }
            let search = DbSearch::new(self.env.clone());
            // Supersede the previous search before releasing the lock
            self.env.page().activate(search.id());
            *current = Some(Arc::clone(&search));
            search
        };
        ignore_expected(search.load_first_page().await)
    }

    pub async fn change_page(&self, pages: isize) -> SearchResult<Option<RunOutcome>> {
        let Some(search) = self.current() else {
            return Ok(None);
        };
        ignore_expected(search.change_page(pages).await)
    }

    pub async fn infinite_scroll(&self) -> SearchResult<Option<RunOutcome>> {
        let Some(search) = self.current() else {
            return Ok(None);
        };
        ignore_expected(search.infinite_scroll().await)
    }

    /// Debounce interval for search input.
    #[must_use]
    pub fn debounce_interval(&self) -> Duration {
        self.env
            .db()
            .debounce_interval()
            .unwrap_or_else(|| self.env.settings().search_debounce())
    }
}

fn ignore_expected(result: SearchResult<RunOutcome>) -> SearchResult<Option<RunOutcome>> {
    match result {
        Ok(outcome) => Ok(Some(outcome)),
        Err(err @ (SearchError::StaleQuery | SearchError::CannotScroll)) => {
            log::debug!("Ignoring {err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
