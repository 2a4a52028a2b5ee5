// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    song::Song,
    source::{Album, MetaEntity, Source},
};

/// A light-weight tag that denotes the [`ResultItem`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResultKind {
    Song,
    Source,
    Album,
}

/// An element of a result list.
///
/// Meta matches (sources and albums) are listed before songs and
/// do not count towards pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum ResultItem {
    Song(Song),
    Source(Source),
    Album(Album),
}

impl ResultItem {
    #[must_use]
    pub const fn kind(&self) -> ResultKind {
        match self {
            Self::Song(_) => ResultKind::Song,
            Self::Source(_) => ResultKind::Source,
            Self::Album(_) => ResultKind::Album,
        }
    }

    #[must_use]
    pub const fn is_song(&self) -> bool {
        matches!(self, Self::Song(_))
    }

    #[must_use]
    pub const fn song(&self) -> Option<&Song> {
        match self {
            Self::Song(song) => Some(song),
            Self::Source(_) | Self::Album(_) => None,
        }
    }
}

impl From<Song> for ResultItem {
    fn from(from: Song) -> Self {
        Self::Song(from)
    }
}

impl From<MetaEntity> for ResultItem {
    fn from(from: MetaEntity) -> Self {
        match from {
            MetaEntity::Source(source) => Self::Source(source),
            MetaEntity::Album(album) => Self::Album(album),
        }
    }
}
