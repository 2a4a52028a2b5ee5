// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{fmt, future::Future, time::Duration};

use songsearch_core::{Filters, MetaEntity, Song};

use crate::search::RequestedItems;

mod memory;
pub use self::memory::{MemoryDatabase, MemoryQuery};

mod timing;
pub use self::timing::TimingStats;

/// A single page of songs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    /// At most [`RequestedItems::size`] songs.
    pub data: Vec<Song>,

    /// The total number of matching songs if it could be
    /// determined without extra cost.
    pub total: Option<usize>,
}

/// Data access used by searches.
///
/// Implementations decide how queries are represented and
/// executed. Searches only hold on to the opaque
/// [`Database::PreparedQuery`] and compare validity tokens.
pub trait Database: Send + Sync + 'static {
    /// Identifies the generation of the underlying data.
    ///
    /// Changes whenever the data changes in a way that invalidates
    /// prepared queries, e.g. after reloading a language pack.
    type Validity: Clone + PartialEq + fmt::Debug + Send + Sync;

    type PreparedQuery: Send + Sync + 'static;

    fn query_validity(&self) -> Self::Validity;

    /// `search` is the normalized free text of `filters`.
    fn prepare_query(
        &self,
        filters: &Filters,
        search: &str,
    ) -> impl Future<Output = anyhow::Result<Self::PreparedQuery>> + Send;

    fn run_search(
        &self,
        query: &Self::PreparedQuery,
        requested: RequestedItems,
    ) -> impl Future<Output = anyhow::Result<SearchResponse>> + Send;

    /// Sources and albums matching the free text.
    fn search_meta(
        &self,
        filters: &Filters,
        search: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<MetaEntity>>> + Send;

    fn get_total(
        &self,
        query: &Self::PreparedQuery,
    ) -> impl Future<Output = anyhow::Result<usize>> + Send;

    /// Records the duration of a search query.
    fn add_timing_stat(&self, elapsed: Duration);

    /// Counting is cheap enough to be done right away.
    fn instant_total_query(&self) -> bool;

    /// Debounce interval for search input, derived from recorded timings.
    fn debounce_interval(&self) -> Option<Duration> {
        None
    }
}
