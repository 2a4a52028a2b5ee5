// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use crate::{
    database::Database, filter::ObservableFilters, page::Page, settings::Settings,
    telemetry::TelemetrySink,
};

/// The collaborators shared by all searches of a view.
///
/// Cheaply `Clone`able and `Send`able.
#[allow(missing_debug_implementations)]
pub struct Environment<D> {
    db: Arc<D>,
    filters: Arc<ObservableFilters>,
    page: Arc<Page>,
    telemetry: Arc<dyn TelemetrySink>,
    settings: Settings,
}

impl<D: Database> Environment<D> {
    #[must_use]
    pub fn new(
        db: Arc<D>,
        filters: Arc<ObservableFilters>,
        telemetry: Arc<dyn TelemetrySink>,
        settings: Settings,
    ) -> Self {
        Self {
            db,
            filters,
            page: Default::default(),
            telemetry,
            settings,
        }
    }

    #[must_use]
    pub fn db(&self) -> &Arc<D> {
        &self.db
    }

    #[must_use]
    pub fn filters(&self) -> &ObservableFilters {
        &self.filters
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn telemetry(&self) -> &dyn TelemetrySink {
        &*self.telemetry
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl<D> Clone for Environment<D> {
    fn clone(&self) -> Self {
        let Self {
            db,
            filters,
            page,
            telemetry,
            settings,
        } = self;
        Self {
            db: Arc::clone(db),
            filters: Arc::clone(filters),
            page: Arc::clone(page),
            telemetry: Arc::clone(telemetry),
            settings: settings.clone(),
        }
    }
}
