// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Mutex;

use discro::Subscriber;
use songsearch_core::{
    AlbumId, AppliedUpdate, Facet, Filters, SortOrder, SourceId, TagConstraint, TagId,
    filter::parse_search,
};

use crate::{Observable, ObservableRef, lock};

pub type FiltersSubscriber = Subscriber<Filters>;

/// Manages the mutable, observable filters
///
/// All setters return `true` if the filters have been modified.
#[derive(Debug, Default)]
pub struct ObservableFilters {
    filters: Observable<Filters>,

    /// Filters set by `key=value` tokens in the search box.
    search_tokens: Mutex<AppliedUpdate>,
}

impl ObservableFilters {
    #[must_use]
    pub fn new(initial_filters: Filters) -> Self {
        Self {
            filters: Observable::new(initial_filters),
            search_tokens: Default::default(),
        }
    }

    #[must_use]
    pub fn read(&self) -> ObservableRef<'_, Filters> {
        self.filters.read()
    }

    /// An owned copy of the current filters.
    #[must_use]
    pub fn snapshot(&self) -> Filters {
        self.filters.read().clone()
    }

    #[must_use]
    pub fn subscribe_changed(&self) -> FiltersSubscriber {
        self.filters.subscribe_changed()
    }

    pub fn modify(&self, modify: impl FnOnce(&mut Filters) -> bool) -> bool {
        self.filters.modify(modify)
    }

    /// Update from the contents of the search box.
    ///
    /// Embedded `key=value` tokens are applied together with
    /// the remaining free text. Filters that have been set by
    /// tokens of the previous contents are reverted first.
    pub fn set_search(&self, input: &str) -> bool {
        let update = parse_search(input);
        let mut search_tokens = lock(&self.search_tokens);
        let changed = self.modify(|filters| {
            let before = filters.clone();
            filters.revert(std::mem::take(&mut *search_tokens));
            *search_tokens = filters.apply_revertible(update);
            *filters != before
        });
        if changed {
            log::debug!("Search updated: {input:?}");
        }
        changed
    }

    pub fn set_order_by(&self, order_by: SortOrder) -> bool {
        self.modify(|filters| {
            if filters.order_by == order_by {
                return false;
            }
            filters.order_by = order_by;
            true
        })
    }

    pub fn set_lang(&self, lang: Option<String>) -> bool {
        self.modify(|filters| {
            if filters.lang == lang {
                return false;
            }
            filters.lang = lang;
            true
        })
    }

    pub fn set_tag(&self, tag_id: TagId, constraint: Option<TagConstraint>) -> bool {
        self.modify(|filters| filters.set_tag(tag_id, constraint))
    }

    /// Cycle through unset, include and exclude.
    pub fn cycle_tag(&self, tag_id: TagId) -> bool {
        self.modify(|filters| {
            let next = match filters.tags.get(&tag_id) {
                None => Some(TagConstraint::Include),
                Some(TagConstraint::Include) => Some(TagConstraint::Exclude),
                Some(TagConstraint::Exclude) => None,
            };
            filters.set_tag(tag_id, next)
        })
    }

    pub fn set_source(&self, source_id: SourceId, selected: bool) -> bool {
        self.modify(|filters| {
            if selected {
                filters.sources.insert(source_id)
            } else {
                filters.sources.remove(&source_id)
            }
        })
    }

    /// Select a single source and deselect all others at once.
    pub fn select_single_source(&self, source_id: SourceId) -> bool {
        self.modify(|filters| {
            if filters.sources.len() == 1 && filters.sources.contains(&source_id) {
                return false;
            }
            filters.sources.clear();
            filters.sources.insert(source_id);
            true
        })
    }

    pub fn clear_sources(&self) -> bool {
        self.modify(|filters| {
            if filters.sources.is_empty() {
                return false;
            }
            filters.sources.clear();
            true
        })
    }

    pub fn set_album(&self, album_id: AlbumId, selected: bool) -> bool {
        self.modify(|filters| {
            if selected {
                filters.albums.insert(album_id)
            } else {
                filters.albums.remove(&album_id)
            }
        })
    }

    pub fn set_facet(&self, facet: Facet, value: Option<bool>) -> bool {
        self.modify(|filters| filters.set_facet(facet, value))
    }

    pub fn set_song_key(&self, song_key: Option<String>) -> bool {
        self.modify(|filters| {
            if filters.song_key == song_key {
                return false;
            }
            filters.song_key = song_key;
            true
        })
    }

    /// Reset all filters except for the language.
    pub fn reset(&self) -> bool {
        let mut search_tokens = lock(&self.search_tokens);
        *search_tokens = AppliedUpdate::default();
        self.modify(|filters| {
            let reset = Filters {
                lang: filters.lang.clone(),
                ..Default::default()
            };
            let changed = *filters != reset;
            *filters = reset;
            changed
        })
    }
}
