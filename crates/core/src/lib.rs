// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Domain model of the song search.
//!
//! Plain values only: no I/O, no async.

// Importing all enum variants into a narrow, local scope is acceptable.
#![allow(clippy::enum_glob_use)]

pub mod filter;
pub mod item;
pub mod song;
pub mod source;
pub mod util;

pub use self::{
    filter::{AppliedUpdate, Facet, Filters, FiltersUpdate, SortOrder, TagConstraint},
    item::{ResultItem, ResultKind},
    song::{Song, SongId, TagId},
    source::{Album, AlbumId, MetaEntity, Source, SourceId},
};

pub mod prelude {
    pub use crate::{
        filter::{AppliedUpdate, Facet, Filters, FiltersUpdate, SortOrder, TagConstraint},
        item::{ResultItem, ResultKind},
        song::{Song, SongId, TagId},
        source::{Album, AlbumId, MetaEntity, Source, SourceId},
        util::string::normalize_search,
    };
}
