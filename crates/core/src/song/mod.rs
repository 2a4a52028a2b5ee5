// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::source::{AlbumId, SourceId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct SongId(pub u32);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TagId(pub u32);

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A song row as returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Song {
    pub id: SongId,

    pub title: String,

    /// Language code, e.g. `en` or `de`.
    pub lang: String,

    /// The number of the song within its source, if any.
    pub number: Option<u32>,

    pub source_id: Option<SourceId>,

    pub album_id: Option<AlbumId>,

    pub tags: Vec<TagId>,

    /// Musical key, e.g. `G` or `Em`.
    pub song_key: Option<String>,

    pub has_audio: bool,

    pub has_chords: bool,

    pub has_sheet: bool,

    pub is_original: bool,

    /// Monotonic insertion order, higher is more recent.
    pub added: u64,

    pub lyrics: String,
}

