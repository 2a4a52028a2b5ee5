// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::{
    song::TagId,
    source::{AlbumId, SourceId},
};

mod parse;
pub use self::parse::parse_search;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Relevance,
    Title,
    Number,
    Recent,
}

impl SortOrder {
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Relevance)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Constraint on a single tag.
///
/// Tags without a constraint are absent from [`Filters::tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum TagConstraint {
    Include,
    Exclude,
}

/// Boolean properties of a song that could be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Facet {
    HasAudio,
    HasChords,
    HasSheet,
    IsOriginal,
    Favourite,
}

impl Facet {
    /// Field name used for persisting and reporting.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::HasAudio => "has_audio",
            Self::HasChords => "has_chords",
            Self::HasSheet => "has_sheet",
            Self::IsOriginal => "is_original",
            Self::Favourite => "favourite",
        }
    }
}

/// Snapshot of all search criteria.
///
/// Two snapshots are interchangeable iff they compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Filters {
    /// Free text, without any embedded `key=value` tokens.
    pub search: String,

    pub order_by: SortOrder,

    /// Language code
    pub lang: Option<String>,

    pub tags: BTreeMap<TagId, TagConstraint>,

    pub sources: BTreeSet<SourceId>,

    pub albums: BTreeSet<AlbumId>,

    pub has_audio: Option<bool>,

    pub has_chords: Option<bool>,

    pub has_sheet: Option<bool>,

    pub is_original: Option<bool>,

    pub favourite: Option<bool>,

    pub song_key: Option<String>,
}

impl Filters {
    #[must_use]
    pub fn is_text_search(&self) -> bool {
        !self.search.trim().is_empty()
    }

    #[must_use]
    pub fn is_filtered_by_source_or_album(&self) -> bool {
        !self.sources.is_empty() || !self.albums.is_empty()
    }

    #[must_use]
    pub const fn facet(&self, facet: Facet) -> Option<bool> {
        match facet {
            Facet::HasAudio => self.has_audio,
            Facet::HasChords => self.has_chords,
            Facet::HasSheet => self.has_sheet,
            Facet::IsOriginal => self.is_original,
            Facet::Favourite => self.favourite,
        }
    }

    fn facet_mut(&mut self, facet: Facet) -> &mut Option<bool> {
        match facet {
            Facet::HasAudio => &mut self.has_audio,
            Facet::HasChords => &mut self.has_chords,
            Facet::HasSheet => &mut self.has_sheet,
            Facet::IsOriginal => &mut self.is_original,
            Facet::Favourite => &mut self.favourite,
        }
    }

    /// Returns `true` if the value has changed.
    pub fn set_facet(&mut self, facet: Facet, value: Option<bool>) -> bool {
        let old_value = self.facet_mut(facet);
        if *old_value == value {
            return false;
        }
        *old_value = value;
        true
    }

    /// Returns `true` if the constraint has changed.
    pub fn set_tag(&mut self, tag_id: TagId, constraint: Option<TagConstraint>) -> bool {
        if let Some(constraint) = constraint {
            self.tags.insert(tag_id, constraint) != Some(constraint)
        } else {
            self.tags.remove(&tag_id).is_some()
        }
    }

    /// Merge a partial update.
    ///
    /// Returns `true` if any field has changed.
    pub fn apply(&mut self, update: FiltersUpdate) -> bool {
        let FiltersUpdate {
            search,
            order_by,
            lang,
            tags,
            sources,
            albums,
            facets,
            song_key,
        } = update;
        let mut changed = false;
        if let Some(search) = search
            && self.search != search
        {
            self.search = search;
            changed = true;
        }
        if let Some(order_by) = order_by
            && self.order_by != order_by
        {
            self.order_by = order_by;
            changed = true;
        }
        if let Some(lang) = lang
            && self.lang.as_ref() != Some(&lang)
        {
            self.lang = Some(lang);
            changed = true;
        }
        for (tag_id, constraint) in tags {
            changed |= self.set_tag(tag_id, Some(constraint));
        }
        for source_id in sources {
            changed |= self.sources.insert(source_id);
        }
        for album_id in albums {
            changed |= self.albums.insert(album_id);
        }
        for (facet, value) in facets {
            changed |= self.set_facet(facet, Some(value));
        }
        if let Some(song_key) = song_key
            && self.song_key.as_ref() != Some(&song_key)
        {
            self.song_key = Some(song_key);
            changed = true;
        }
        changed
    }

    /// Merge a partial update that could be reverted later.
    ///
    /// Only the filters that have actually been modified are recorded.
    pub fn apply_revertible(&mut self, update: FiltersUpdate) -> AppliedUpdate {
        let FiltersUpdate {
            search,
            order_by,
            lang,
            tags,
            sources,
            albums,
            facets,
            song_key,
        } = update;
        let mut applied = AppliedUpdate::default();
        if let Some(search) = search {
            self.search = search;
        }
        if let Some(order_by) = order_by {
            let previous = std::mem::replace(&mut self.order_by, order_by);
            applied.order_by = Replaced::new(previous, order_by);
        }
        if let Some(lang) = lang {
            let previous = self.lang.replace(lang.clone());
            applied.lang = Replaced::new(previous, Some(lang));
        }
        for (tag_id, constraint) in tags {
            let previous = self.tags.insert(tag_id, constraint);
            if let Some(replaced) = Replaced::new(previous, Some(constraint)) {
                applied.tags.push((tag_id, replaced));
            }
        }
        for source_id in sources {
            if self.sources.insert(source_id) {
                applied.sources.push(source_id);
            }
        }
        for album_id in albums {
            if self.albums.insert(album_id) {
                applied.albums.push(album_id);
            }
        }
        for (facet, value) in facets {
            let previous = self.facet_mut(facet).replace(value);
            if let Some(replaced) = Replaced::new(previous, Some(value)) {
                applied.facets.push((facet, replaced));
            }
        }
        if let Some(song_key) = song_key {
            let previous = self.song_key.replace(song_key.clone());
            applied.song_key = Replaced::new(previous, Some(song_key));
        }
        applied
    }

    /// Undo an update that has been applied before.
    ///
    /// Filters that have been modified since are left untouched.
    /// Returns `true` if any field has changed.
    pub fn revert(&mut self, applied: AppliedUpdate) -> bool {
        let AppliedUpdate {
            order_by,
            lang,
            tags,
            sources,
            albums,
            facets,
            song_key,
        } = applied;
        let mut changed = false;
        if let Some(order_by) = order_by {
            changed |= order_by.revert(&mut self.order_by);
        }
        if let Some(lang) = lang {
            changed |= lang.revert(&mut self.lang);
        }
        // Reverse order for repeated tokens with the same key
        for (tag_id, replaced) in tags.into_iter().rev() {
            let mut constraint = self.tags.get(&tag_id).copied();
            if replaced.revert(&mut constraint) {
                changed |= self.set_tag(tag_id, constraint);
            }
        }
        for source_id in sources {
            changed |= self.sources.remove(&source_id);
        }
        for album_id in albums {
            changed |= self.albums.remove(&album_id);
        }
        for (facet, replaced) in facets.into_iter().rev() {
            changed |= replaced.revert(self.facet_mut(facet));
        }
        if let Some(song_key) = song_key {
            changed |= song_key.revert(&mut self.song_key);
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Replaced<T> {
    previous: T,
    applied: T,
}

impl<T: PartialEq> Replaced<T> {
    fn new(previous: T, applied: T) -> Option<Self> {
        (previous != applied).then_some(Self { previous, applied })
    }

    fn revert(self, value: &mut T) -> bool {
        if *value != self.applied {
            return false;
        }
        *value = self.previous;
        true
    }
}

/// Record of the modifications made by [`Filters::apply_revertible()`].
///
/// The free text is not recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedUpdate {
    order_by: Option<Replaced<SortOrder>>,
    lang: Option<Replaced<Option<String>>>,
    tags: Vec<(TagId, Replaced<Option<TagConstraint>>)>,
    sources: Vec<SourceId>,
    albums: Vec<AlbumId>,
    facets: Vec<(Facet, Replaced<Option<bool>>)>,
    song_key: Option<Replaced<Option<String>>>,
}

impl AppliedUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Partial update of [`Filters`].
///
/// Fields that are `None` or empty leave the corresponding
/// filter untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiltersUpdate {
    pub search: Option<String>,
    pub order_by: Option<SortOrder>,
    pub lang: Option<String>,
    pub tags: Vec<(TagId, TagConstraint)>,
    pub sources: Vec<SourceId>,
    pub albums: Vec<AlbumId>,
    pub facets: Vec<(Facet, bool)>,
    pub song_key: Option<String>,
}

impl FiltersUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
