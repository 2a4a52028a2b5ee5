// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    cmp::Ordering,
    collections::BTreeSet,
    future::Future,
    sync::{
        Mutex, RwLock,
        atomic::{AtomicU64, Ordering as AtomicOrdering},
    },
    time::Duration,
};

use songsearch_core::{
    Album, Filters, MetaEntity, Song, SongId, SortOrder, Source, TagConstraint,
    filter::Facet, util::string::normalize_search,
};

use super::{Database, SearchResponse, TimingStats};
use crate::{lock, search::RequestedItems};

const MIN_DEBOUNCE: Duration = Duration::from_millis(50);

const MAX_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct Catalog {
    songs: Vec<Song>,
    sources: Vec<Source>,
    albums: Vec<Album>,
    favourites: BTreeSet<SongId>,
}

/// A prepared query of [`MemoryDatabase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryQuery {
    filters: Filters,
    terms: Vec<String>,
}

impl MemoryQuery {
    fn matches_text(&self, song: &Song) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let haystack = normalize_search(&format!("{} {}", song.title, song.lyrics));
        self.terms.iter().all(|term| haystack.contains(term.as_str()))
    }

    fn matches(&self, song: &Song, favourites: &BTreeSet<SongId>) -> bool {
        let Filters {
            search: _,
            order_by: _,
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
        } = &self.filters;
        if lang.as_ref().is_some_and(|lang| *lang != song.lang) {
            return false;
        }
        for (tag_id, constraint) in tags {
            let tagged = song.tags.contains(tag_id);
            match constraint {
                TagConstraint::Include if !tagged => return false,
                TagConstraint::Exclude if tagged => return false,
                _ => (),
            }
        }
        if !sources.is_empty()
            && !song
                .source_id
                .is_some_and(|source_id| sources.contains(&source_id))
        {
            return false;
        }
        if !albums.is_empty()
            && !song
                .album_id
                .is_some_and(|album_id| albums.contains(&album_id))
        {
            return false;
        }
        if song_key.as_ref().is_some_and(|key| {
            !song
                .song_key
                .as_ref()
                .is_some_and(|song_key| song_key.eq_ignore_ascii_case(key))
        }) {
            return false;
        }
        let facets = [
            (Facet::HasAudio, song.has_audio),
            (Facet::HasChords, song.has_chords),
            (Facet::HasSheet, song.has_sheet),
            (Facet::IsOriginal, song.is_original),
            (Facet::Favourite, favourites.contains(&song.id)),
        ];
        for (facet, value) in facets {
            if self.filters.facet(facet).is_some_and(|wanted| wanted != value) {
                return false;
            }
        }
        self.matches_text(song)
    }

    fn title_matches(&self, song: &Song) -> bool {
        let title = normalize_search(&song.title);
        !self.terms.is_empty() && self.terms.iter().all(|term| title.contains(term.as_str()))
    }

    fn compare(&self, lhs: &Song, rhs: &Song) -> Ordering {
        match self.filters.order_by {
            SortOrder::Relevance => self
                .title_matches(rhs)
                .cmp(&self.title_matches(lhs))
                .then_with(|| lhs.id.cmp(&rhs.id)),
            SortOrder::Title => normalize_search(&lhs.title)
                .cmp(&normalize_search(&rhs.title))
                .then_with(|| lhs.id.cmp(&rhs.id)),
            SortOrder::Number => (lhs.source_id, lhs.number, lhs.id).cmp(&(
                rhs.source_id,
                rhs.number,
                rhs.id,
            )),
            SortOrder::Recent => rhs.added.cmp(&lhs.added).then_with(|| lhs.id.cmp(&rhs.id)),
        }
    }
}

/// In-memory song catalog.
///
/// Serves as a reference implementation of [`Database`].
#[derive(Debug)]
pub struct MemoryDatabase {
    catalog: RwLock<Catalog>,
    generation: AtomicU64,
    latency: Mutex<Duration>,
    inline_total: bool,
    instant_total: bool,
    timing: Mutex<TimingStats>,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new(songs: Vec<Song>) -> Self {
        Self {
            catalog: RwLock::new(Catalog {
                songs,
                ..Default::default()
            }),
            generation: AtomicU64::new(0),
            latency: Mutex::new(Duration::ZERO),
            inline_total: false,
            instant_total: true,
            timing: Default::default(),
        }
    }

    #[must_use]
    pub fn with_sources(self, sources: Vec<Source>) -> Self {
        self.write_catalog().sources = sources;
        self
    }

    #[must_use]
    pub fn with_albums(self, albums: Vec<Album>) -> Self {
        self.write_catalog().albums = albums;
        self
    }

    /// Include the total in every [`SearchResponse`].
    #[must_use]
    pub fn with_inline_total(mut self, inline_total: bool) -> Self {
        self.inline_total = inline_total;
        self
    }

    #[must_use]
    pub fn with_instant_total(mut self, instant_total: bool) -> Self {
        self.instant_total = instant_total;
        self
    }

    /// Delay of every query.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    pub fn set_favourite(&self, song_id: SongId, favourite: bool) {
        let mut catalog = self.write_catalog();
        if favourite {
            catalog.favourites.insert(song_id);
        } else {
            catalog.favourites.remove(&song_id);
        }
    }

    /// Replace all songs and invalidate prepared queries.
    pub fn reload(&self, songs: Vec<Song>) {
        self.write_catalog().songs = songs;
        let generation = self.generation.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        log::info!("Reloaded songs: generation = {generation}");
    }

    #[must_use]
    pub fn timing_stats(&self) -> TimingStats {
        lock(&self.timing).clone()
    }

    fn write_catalog(&self) -> std::sync::RwLockWriteGuard<'_, Catalog> {
        self.catalog
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn read_catalog(&self) -> std::sync::RwLockReadGuard<'_, Catalog> {
        self.catalog
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn select(&self, query: &MemoryQuery) -> Vec<Song> {
        let catalog = self.read_catalog();
        let mut songs: Vec<_> = catalog
            .songs
            .iter()
            .filter(|song| query.matches(song, &catalog.favourites))
            .cloned()
            .collect();
        songs.sort_by(|lhs, rhs| query.compare(lhs, rhs));
        songs
    }

    fn count(&self, query: &MemoryQuery) -> usize {
        let catalog = self.read_catalog();
        catalog
            .songs
            .iter()
            .filter(|song| query.matches(song, &catalog.favourites))
            .count()
    }
}

impl Database for MemoryDatabase {
    type Validity = u64;

    type PreparedQuery = MemoryQuery;

    fn query_validity(&self) -> Self::Validity {
        self.generation.load(AtomicOrdering::SeqCst)
    }

    fn prepare_query(
        &self,
        filters: &Filters,
        search: &str,
    ) -> impl Future<Output = anyhow::Result<Self::PreparedQuery>> + Send {
        let query = MemoryQuery {
            filters: filters.clone(),
            terms: search.split_whitespace().map(ToOwned::to_owned).collect(),
        };
        async move { Ok(query) }
    }

    fn run_search(
        &self,
        query: &Self::PreparedQuery,
        requested: RequestedItems,
    ) -> impl Future<Output = anyhow::Result<SearchResponse>> + Send {
        async move {
            self.simulate_latency().await;
            let songs = self.select(query);
            let total = self.inline_total.then_some(songs.len());
            let data = songs
                .into_iter()
                .skip(requested.start)
                .take(requested.size)
                .collect();
            Ok(SearchResponse { data, total })
        }
    }

    fn search_meta(
        &self,
        _filters: &Filters,
        search: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<MetaEntity>>> + Send {
        let terms: Vec<_> = search.split_whitespace().map(ToOwned::to_owned).collect();
        async move {
            self.simulate_latency().await;
            if terms.is_empty() {
                return Ok(Vec::new());
            }
            let matches_all = |text: &str| {
                let text = normalize_search(text);
                terms.iter().all(|term| text.contains(term.as_str()))
            };
            let catalog = self.read_catalog();
            let sources = catalog
                .sources
                .iter()
                .filter(|source| {
                    matches_all(&source.name)
                        || source.abbreviation.as_deref().is_some_and(matches_all)
                })
                .cloned()
                .map(MetaEntity::Source);
            let albums = catalog
                .albums
                .iter()
                .filter(|album| matches_all(&album.title))
                .cloned()
                .map(MetaEntity::Album);
            Ok(sources.chain(albums).collect())
        }
    }

    fn get_total(
        &self,
        query: &Self::PreparedQuery,
    ) -> impl Future<Output = anyhow::Result<usize>> + Send {
        async move {
            self.simulate_latency().await;
            Ok(self.count(query))
        }
    }

    fn add_timing_stat(&self, elapsed: Duration) {
        lock(&self.timing).add(elapsed);
    }

    fn instant_total_query(&self) -> bool {
        self.instant_total
    }

    fn debounce_interval(&self) -> Option<Duration> {
        lock(&self.timing).debounce_interval(MIN_DEBOUNCE, MAX_DEBOUNCE)
    }
}
