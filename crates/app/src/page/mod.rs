// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use discro::Subscriber;
use songsearch_core::ResultItem;

use crate::{
    Observable, ObservableRef,
    search::{PagerSummary, RequestedItems},
};

/// Identifies a search instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchId(u64);

impl SearchId {
    pub(crate) fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SearchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The rendered results of the active search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongList {
    /// Meta matches first, then songs.
    pub items: Vec<ResultItem>,

    /// The request that produced the last update.
    pub requested: Option<RequestedItems>,

    pub pager: PagerSummary,

    /// The search that produced the contents.
    pub search_id: Option<SearchId>,
}

impl SongList {
    #[must_use]
    pub fn song_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_song()).count()
    }

    fn apply(
        &mut self,
        search_id: SearchId,
        items: Vec<ResultItem>,
        requested: RequestedItems,
        pager: PagerSummary,
    ) {
        if requested.infinite_scroll && self.search_id == Some(search_id) {
            self.items.extend(items);
        } else {
            self.items = items;
        }
        self.requested = Some(requested);
        self.pager = pager;
        self.search_id = Some(search_id);
    }
}

pub type SongListSubscriber = Subscriber<SongList>;

/// Shared state of a single view.
///
/// At most one search is active at any time. Only the active
/// search is permitted to update the song list.
#[derive(Debug, Default)]
pub struct Page {
    // 0 = none
    active_search: AtomicU64,
    song_list: Observable<SongList>,
}

impl Page {
    pub fn activate(&self, search_id: SearchId) {
        let SearchId(id) = search_id;
        let previous = self.active_search.swap(id, Ordering::SeqCst);
        if previous != id {
            log::debug!("Activated search {search_id}");
        }
    }

    #[must_use]
    pub fn is_active(&self, search_id: SearchId) -> bool {
        let SearchId(id) = search_id;
        self.active_search.load(Ordering::SeqCst) == id
    }

    #[must_use]
    pub fn active_search(&self) -> Option<SearchId> {
        match self.active_search.load(Ordering::SeqCst) {
            0 => None,
            id => Some(SearchId(id)),
        }
    }

    #[must_use]
    pub fn read(&self) -> ObservableRef<'_, SongList> {
        self.song_list.read()
    }

    #[must_use]
    pub fn subscribe_changed(&self) -> SongListSubscriber {
        self.song_list.subscribe_changed()
    }

    /// Returns `false` if the search is not active (anymore).
    pub fn apply_results(
        &self,
        search_id: SearchId,
        items: Vec<ResultItem>,
        requested: RequestedItems,
        pager: PagerSummary,
    ) -> bool {
        self.song_list.modify(|song_list| {
            if !self.is_active(search_id) {
                log::debug!("Discarding results of inactive search {search_id}");
                return false;
            }
            song_list.apply(search_id, items, requested, pager);
            true
        })
    }

    /// Returns `false` if the search is not active (anymore).
    pub fn apply_pager(&self, search_id: SearchId, pager: PagerSummary) -> bool {
        self.song_list.modify(|song_list| {
            if !self.is_active(search_id) || song_list.search_id != Some(search_id) {
                return false;
            }
            if song_list.pager == pager {
                return false;
            }
            song_list.pager = pager;
            true
        })
    }

    pub fn clear(&self) -> bool {
        self.active_search.store(0, Ordering::SeqCst);
        self.song_list.modify(|song_list| {
            if *song_list == SongList::default() {
                return false;
            }
            *song_list = SongList::default();
            true
        })
    }
}
