// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{future::Future, sync::Arc};

use crate::{database::Database, filter::FiltersSubscriber};

use super::SearchStore;

/// Search whenever the filters have changed.
///
/// Changes are debounced. Each search runs in a separate task and
/// supersedes the previous one. A subscriber obtained by
/// `subscribe_changed()` also triggers an initial search.
///
/// Stops when either the filters or the store have been dropped.
pub fn on_filters_changed<D: Database>(
    store: &Arc<SearchStore<D>>,
    mut filters_sub: FiltersSubscriber,
) -> impl Future<Output = ()> + Send + 'static {
    let store = Arc::downgrade(store);
    async move {
        log::debug!("Starting on_filters_changed");
        'listen: loop {
            if filters_sub.changed().await.is_err() {
                // Publisher has disappeared
                break;
            }
            drop(filters_sub.read_ack());
            let Some(debounce_interval) = store.upgrade().map(|store| store.debounce_interval())
            else {
                // Store has been dropped
                break;
            };
            loop {
                match tokio::time::timeout(debounce_interval, filters_sub.changed()).await {
                    Ok(Ok(())) => {
                        drop(filters_sub.read_ack());
                    }
                    Ok(Err(_)) => {
                        break 'listen;
                    }
                    Err(_elapsed) => break,
                }
            }
            let Some(store) = store.upgrade() else {
                break;
            };
            tokio::spawn(async move {
                if let Err(err) = store.search().await {
                    log::warn!("Search failed: {err}");
                }
            });
        }
        log::debug!("Stopping on_filters_changed");
    }
}
