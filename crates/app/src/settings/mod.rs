// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::search::{DEFAULT_SCROLL_LIMIT, Pager};

pub const FILE_NAME: &str = "songsearch_settings";

pub const FILE_SUFFIX: &str = "ron";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    Desktop,
    Mobile,
}

impl Layout {
    #[must_use]
    pub const fn page_size(self) -> usize {
        match self {
            Self::Desktop => 50,
            Self::Mobile => 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Determines the page size.
    pub layout: Layout,

    /// Maximum number of items that could be loaded by infinite
    /// scrolling beyond the last manually selected page.
    pub scroll_limit: usize,

    /// Queries that take longer are considered slow.
    pub slow_query_threshold_ms: u64,

    /// Delay for counting the results of slow queries.
    pub deferred_total_delay_ms: u64,

    /// Debounce interval for search input if the database
    /// does not suggest one.
    pub search_debounce_ms: u64,

    /// Telemetry events are dropped after this period.
    pub telemetry_expiry_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            scroll_limit: DEFAULT_SCROLL_LIMIT,
            slow_query_threshold_ms: 100,
            deferred_total_delay_ms: 1500,
            search_debounce_ms: 150,
            telemetry_expiry_secs: 300,
        }
    }
}

impl Settings {
    pub fn load(parent_dir: &Path) -> anyhow::Result<Settings> {
        let file_path = new_settings_file_path(parent_dir.to_path_buf());
        log::info!("Loading settings from file: {}", file_path.display());
        match fs::read_to_string(&file_path) {
            Ok(text) => ron::from_str(&text).map_err(Into::into),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Default::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, parent_dir: &Path) -> anyhow::Result<()> {
        let file_path = new_settings_file_path(parent_dir.to_path_buf());
        log::info!("Saving current settings into file: {}", file_path.display());
        let text = ron::ser::to_string_pretty(self, Default::default())?;
        if let Some(parent_path) = file_path.parent() {
            fs::create_dir_all(parent_path)?;
        }
        fs::write(&file_path, text)?;
        Ok(())
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.layout.page_size()
    }

    #[must_use]
    pub fn new_pager(&self) -> Pager {
        Pager::new(self.page_size(), self.scroll_limit)
    }

    #[must_use]
    pub const fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }

    #[must_use]
    pub const fn deferred_total_delay(&self) -> Duration {
        Duration::from_millis(self.deferred_total_delay_ms)
    }

    #[must_use]
    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    #[must_use]
    pub const fn telemetry_expiry(&self) -> Duration {
        Duration::from_secs(self.telemetry_expiry_secs)
    }
}

#[must_use]
fn new_settings_file_path(parent_dir: PathBuf) -> PathBuf {
    let mut path_buf = parent_dir;
    path_buf.push(FILE_NAME);
    path_buf.set_extension(FILE_SUFFIX);
    path_buf
}

/// Load the saved settings or fall back to the defaults.
#[must_use]
pub fn restore_from_parent_dir(parent_dir: &Path) -> Settings {
    log::info!("Loading saved settings from: {}", parent_dir.display());
    Settings::load(parent_dir)
        .map_err(|err| {
            log::warn!("Failed to load saved settings: {err}");
        })
        .unwrap_or_default()
}
