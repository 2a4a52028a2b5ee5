// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::str::FromStr as _;

use super::{Facet, FiltersUpdate, SortOrder, TagConstraint};
use crate::{
    song::TagId,
    source::{AlbumId, SourceId},
    util::string::trimmed_non_empty,
};

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "y" => Some(true),
        "0" | "no" | "false" | "n" => Some(false),
        _ => None,
    }
}

fn parse_facet_key(key: &str) -> Option<Facet> {
    let facet = match key {
        "audio" | "has_audio" => Facet::HasAudio,
        "chords" | "has_chords" => Facet::HasChords,
        "sheet" | "has_sheet" => Facet::HasSheet,
        "original" | "is_original" => Facet::IsOriginal,
        "fav" | "favourite" | "favorite" => Facet::Favourite,
        _ => return None,
    };
    Some(facet)
}

/// Consumes a single `key=value` token.
///
/// Returns `false` if the token is not recognized and must
/// be treated as free text.
fn apply_token(update: &mut FiltersUpdate, key: &str, value: &str) -> bool {
    let key = key.to_ascii_lowercase();
    match key.as_str() {
        "lang" => {
            let Some(lang) = trimmed_non_empty(value.to_ascii_lowercase()) else {
                return false;
            };
            update.lang = Some(lang);
        }
        "key" => {
            let Some(song_key) = trimmed_non_empty(value.to_owned()) else {
                return false;
            };
            update.song_key = Some(song_key);
        }
        "order" | "sort" => {
            let Ok(order_by) = SortOrder::from_str(value) else {
                return false;
            };
            update.order_by = Some(order_by);
        }
        "source" => {
            let Ok(id) = value.parse() else {
                return false;
            };
            update.sources.push(SourceId(id));
        }
        "album" => {
            let Ok(id) = value.parse() else {
                return false;
            };
            update.albums.push(AlbumId(id));
        }
        "tag" | "-tag" => {
            let Ok(id) = value.parse() else {
                return false;
            };
            let constraint = if key.starts_with('-') {
                TagConstraint::Exclude
            } else {
                TagConstraint::Include
            };
            update.tags.push((TagId(id), constraint));
        }
        _ => {
            let (Some(facet), Some(value)) = (parse_facet_key(&key), parse_bool(value)) else {
                return false;
            };
            update.facets.push((facet, value));
        }
    }
    true
}

/// Splits the contents of the search box into filters and free text.
///
/// Recognized `key=value` tokens become fields of the returned update.
/// All other tokens are joined into [`FiltersUpdate::search`], which is
/// always `Some`, even if empty.
#[must_use]
pub fn parse_search(input: &str) -> FiltersUpdate {
    let mut update = FiltersUpdate::default();
    let mut free_text = Vec::new();
    for token in input.split_whitespace() {
        let consumed = token
            .split_once('=')
            .is_some_and(|(key, value)| apply_token(&mut update, key, value));
        if !consumed {
            free_text.push(token);
        }
    }
    update.search = Some(free_text.join(" "));
    update
}
