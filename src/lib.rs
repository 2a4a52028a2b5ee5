// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Paginated song and lyrics search.
//!
//! Re-exports the domain model and, with the `app` feature, the
//! search coordination layer as [`app`].

pub use songsearch_core::*;

#[cfg(feature = "app")]
pub use songsearch_app as app;
