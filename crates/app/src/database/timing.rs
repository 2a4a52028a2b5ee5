// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{collections::VecDeque, num::NonZeroUsize, time::Duration};

pub(super) const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(15);

/// Moving window of recent query durations.
#[derive(Debug, Clone)]
pub struct TimingStats {
    samples: VecDeque<Duration>,
    capacity: NonZeroUsize,
}

impl TimingStats {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    pub fn add(&mut self, elapsed: Duration) {
        if self.samples.len() >= self.capacity.get() {
            self.samples.pop_front();
        }
        self.samples.push_back(elapsed);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn average(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: Duration = self.samples.iter().sum();
        Some(sum / self.samples.len() as u32)
    }

    /// The average query duration, clamped into `[min, max]`.
    #[must_use]
    pub fn debounce_interval(&self, min: Duration, max: Duration) -> Option<Duration> {
        debug_assert!(min <= max);
        self.average().map(|average| average.clamp(min, max))
    }
}

impl Default for TimingStats {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
