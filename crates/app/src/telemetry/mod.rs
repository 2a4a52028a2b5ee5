// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    collections::{BTreeMap, VecDeque},
    ops::Not as _,
    sync::Mutex,
    time::Duration,
};

use serde::Serialize;
use songsearch_core::{Facet, Filters, TagConstraint};
use strum::IntoEnumIterator as _;
use tokio::time::Instant;

use crate::{lock, search::RequestedItems};

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &usize) -> bool {
    *value == 0
}

fn duration_millis(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}

/// Summary of a single search run.
///
/// Fields with default values are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchTelemetry {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// 1 = include, 0 = exclude
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<u32, u8>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<u32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub albums: Vec<u32>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<&'static str, bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_key: Option<String>,

    #[serde(skip_serializing_if = "is_zero")]
    pub start: usize,

    #[serde(skip_serializing_if = "<&bool>::not")]
    pub infinite_scroll: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_elapsed_ms: Option<u64>,

    #[serde(skip_serializing_if = "<&bool>::not")]
    pub failed: bool,
}

impl SearchTelemetry {
    #[must_use]
    pub fn new(filters: &Filters, requested: RequestedItems) -> Self {
        let Filters {
            search,
            order_by,
            lang,
            tags,
            sources,
            albums,
            has_audio: _,
            has_chords: _,
            has_sheet: _,
            is_original: _,
            favourite: _,
            song_key,
        } = filters;
        let tags = tags
            .iter()
            .map(|(tag_id, constraint)| {
                let value = match constraint {
                    TagConstraint::Include => 1,
                    TagConstraint::Exclude => 0,
                };
                (tag_id.0, value)
            })
            .collect();
        let facets = Facet::iter()
            .filter_map(|facet| filters.facet(facet).map(|value| (facet.key(), value)))
            .collect();
        Self {
            search: search.trim().to_owned(),
            order_by: order_by.is_default().not().then(|| order_by.as_str()),
            lang: lang.clone(),
            tags,
            sources: sources.iter().map(|id| id.0).collect(),
            albums: albums.iter().map(|id| id.0).collect(),
            facets,
            song_key: song_key.clone(),
            start: requested.start,
            infinite_scroll: requested.infinite_scroll,
            elapsed_ms: None,
            meta_elapsed_ms: None,
            failed: false,
        }
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Option<Duration>, meta_elapsed: Option<Duration>) -> Self {
        self.elapsed_ms = elapsed.map(duration_millis);
        self.meta_elapsed_ms = meta_elapsed.map(duration_millis);
        self
    }

    #[must_use]
    pub fn with_failed(mut self, failed: bool) -> Self {
        self.failed = failed;
        self
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Receives a summary after each search run.
pub trait TelemetrySink: Send + Sync {
    fn submit(&self, event: SearchTelemetry);
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTelemetry;

impl TelemetrySink for NoTelemetry {
    fn submit(&self, _event: SearchTelemetry) {}
}

/// Collects events for sending them in batches.
///
/// Events expire after a fixed period. If the queue is full the
/// oldest events are dropped.
#[derive(Debug)]
pub struct QueuedTelemetry {
    expiry: Duration,
    capacity: usize,
    queue: Mutex<VecDeque<(Instant, SearchTelemetry)>>,
}

impl QueuedTelemetry {
    #[must_use]
    pub fn new(expiry: Duration, capacity: usize) -> Self {
        Self {
            expiry,
            capacity: capacity.max(1),
            queue: Default::default(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let mut queue = lock(&self.queue);
        self.discard_expired(&mut queue);
        queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take all pending events.
    #[must_use]
    pub fn drain(&self) -> Vec<serde_json::Value> {
        let mut queue = lock(&self.queue);
        self.discard_expired(&mut queue);
        queue
            .drain(..)
            .filter_map(|(_, event)| {
                event
                    .to_json()
                    .map_err(|err| log::warn!("Failed to serialize telemetry event: {err}"))
                    .ok()
            })
            .collect()
    }

    fn discard_expired(&self, queue: &mut VecDeque<(Instant, SearchTelemetry)>) {
        let now = Instant::now();
        while let Some((submitted, _)) = queue.front() {
            if now.duration_since(*submitted) < self.expiry {
                break;
            }
            queue.pop_front();
        }
    }
}

impl TelemetrySink for QueuedTelemetry {
    fn submit(&self, event: SearchTelemetry) {
        let mut queue = lock(&self.queue);
        self.discard_expired(&mut queue);
        while queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back((Instant::now(), event));
    }
}
