// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

/// Maximum distance in items between the last manually selected
/// page and the end of an infinitely scrolled list.
pub const DEFAULT_SCROLL_LIMIT: usize = 180;

/// The window of rows requested from the database.
///
/// One more row than a page holds is requested for detecting
/// if there is a next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedItems {
    pub start: usize,
    pub size: usize,
    pub infinite_scroll: bool,
}

/// Read-only snapshot of a [`Pager`] for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagerSummary {
    pub page_size: usize,
    pub first: usize,
    pub last: usize,
    pub total: Option<usize>,
    pub min_total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Pagination of a single search.
///
/// The total number of results is often unknown. A lower bound
/// is inferred from the pages that have been fetched so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    scroll_limit: usize,

    /// Offset of the next request.
    start: usize,

    total: Option<usize>,
    min_total: usize,

    /// Offset of the last page that has not been reached by
    /// infinite scrolling.
    last_real_start: usize,

    // Offsets confirmed by completed requests.
    last_start_update: usize,
    last_end_update: usize,
}

impl Pager {
    #[must_use]
    pub fn new(page_size: usize, scroll_limit: usize) -> Self {
        debug_assert!(page_size > 0);
        Self {
            page_size: page_size.max(1),
            scroll_limit,
            start: 0,
            total: None,
            min_total: 0,
            last_real_start: 0,
            last_start_update: 0,
            last_end_update: 0,
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// The exact number of results if known.
    #[must_use]
    pub const fn total(&self) -> Option<usize> {
        self.total
    }

    #[must_use]
    pub const fn min_total(&self) -> usize {
        self.min_total
    }

    #[must_use]
    pub const fn requested_items(&self, infinite_scroll: bool) -> RequestedItems {
        RequestedItems {
            start: self.start,
            size: self.page_size + 1,
            infinite_scroll,
        }
    }

    /// Move `pages` forward or backward.
    ///
    /// Returns `false` and leaves the pager untouched if the move
    /// is not possible.
    pub fn change_page(&mut self, pages: isize, infinite_scroll: bool) -> bool {
        if pages == 0 {
            return false;
        }
        if infinite_scroll && self.start.saturating_sub(self.last_real_start) > self.scroll_limit {
            log::debug!(
                "Infinite scrolling exceeded limit: start = {start}, last real start = {last_real_start}",
                start = self.start,
                last_real_start = self.last_real_start,
            );
            return false;
        }
        let page_size = self.page_size as isize;
        // Moving back always returns to the last page that has been
        // selected manually.
        let base = if pages < 0 {
            self.last_real_start
        } else {
            self.start
        };
        let base = base as isize;
        let mut start = base.saturating_add(pages.saturating_mul(page_size));
        if let Some(total) = self.total {
            let total = total as isize;
            if start >= total {
                if pages > 0 {
                    return false;
                }
                while start >= total && start > 0 {
                    start -= page_size;
                }
            }
        }
        if start < 0 {
            return false;
        }
        self.start = start as usize;
        if !infinite_scroll {
            self.last_real_start = self.start;
        }
        true
    }

    /// Reconcile the results of a completed request.
    ///
    /// `on_cur_page` is the number of rows returned, including
    /// the extra row for detecting a next page.
    pub fn update(&mut self, requested: RequestedItems, on_cur_page: usize) {
        if let Some(total) = self.total
            && requested.start > 0
            && requested.start >= total
        {
            log::debug!(
                "Ignoring results beyond total: start = {start}, total = {total}",
                start = requested.start
            );
            return;
        }
        if self.total.is_none() && on_cur_page < requested.size {
            self.total = Some(requested.start + on_cur_page);
        }
        if !requested.infinite_scroll {
            self.last_start_update = requested.start;
        }
        self.last_end_update = requested.start + on_cur_page.min(self.page_size);
        self.min_total = self.min_total.max(requested.start + on_cur_page);
    }

    /// The exact total takes precedence over the lower bound,
    /// which never decreases.
    pub fn set_total(&mut self, total: usize) {
        self.total = Some(total);
        self.min_total = self.min_total.max(total);
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.last_start_update > 0
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        if let Some(total) = self.total {
            self.last_end_update < total
        } else {
            self.min_total > self.last_end_update
        }
    }

    /// One-based position of the first visible result, 0 if none.
    #[must_use]
    pub const fn first(&self) -> usize {
        if self.last_end_update > self.last_start_update {
            self.last_start_update + 1
        } else {
            0
        }
    }

    /// One-based position of the last visible result, 0 if none.
    #[must_use]
    pub const fn last(&self) -> usize {
        self.last_end_update
    }

    #[must_use]
    pub const fn no_results(&self) -> bool {
        matches!(self.total, Some(0))
    }

    #[must_use]
    pub const fn summary(&self) -> PagerSummary {
        PagerSummary {
            page_size: self.page_size,
            first: self.first(),
            last: self.last(),
            total: self.total,
            min_total: self.min_total,
            has_prev: self.has_prev(),
            has_next: self.has_next(),
        }
    }
}
