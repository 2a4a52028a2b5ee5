// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

pub fn trim_in_place(s: &mut String) {
    s.truncate(s.trim_end().len());
    let drain_start_len = s.len() - s.trim_start().len();
    drop(s.drain(0..drain_start_len));
}

#[must_use]
pub fn non_empty_from(s: impl AsRef<str> + Into<String>) -> Option<String> {
    if s.as_ref().is_empty() {
        None
    } else {
        Some(s.into())
    }
}

#[must_use]
pub fn trimmed_non_empty(mut s: String) -> Option<String> {
    trim_in_place(&mut s);
    non_empty_from(s)
}

/// Canonical form of a search string.
///
/// Transliterates to ASCII, folds case and collapses whitespace.
/// Applying it twice yields the same result.
#[must_use]
pub fn normalize_search(input: &str) -> String {
    let ascii = deunicode::deunicode(input);
    let mut normalized = String::with_capacity(ascii.len());
    for word in ascii.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.extend(word.chars().map(|c| c.to_ascii_lowercase()));
    }
    normalized
}

///////////////////////////////////////////////////////////////////////
// Tests
///////////////////////////////////////////////////////////////////////
