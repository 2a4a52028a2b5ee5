// SPDX-FileCopyrightText: Copyright (C) 2018-2026 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::future;

use songsearch_core::{MetaEntity, ResultKind, Song, SongId, Source, SourceId};

use super::*;
use crate::{
    database::MemoryDatabase,
    filter::ObservableFilters,
    settings::Settings,
    telemetry::{DEFAULT_QUEUE_CAPACITY, QueuedTelemetry},
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn song(id: u32, title: &str, lang: &str) -> Song {
    Song {
        id: SongId(id),
        title: title.to_owned(),
        lang: lang.to_owned(),
        ..Default::default()
    }
}

fn numbered_songs(ids: std::ops::RangeInclusive<u32>, lang: &str) -> Vec<Song> {
    ids.map(|id| song(id, &format!("Song {id}"), lang)).collect()
}

struct Fixture<D> {
    env: Environment<D>,
    telemetry: Arc<QueuedTelemetry>,
}

impl<D: Database> Fixture<D> {
    fn with_settings(db: D, settings: Settings) -> Self {
        init_logger();
        let telemetry = Arc::new(QueuedTelemetry::new(
            settings.telemetry_expiry(),
            DEFAULT_QUEUE_CAPACITY,
        ));
        let env = Environment::new(
            Arc::new(db),
            Arc::new(ObservableFilters::default()),
            Arc::clone(&telemetry) as _,
            settings,
        );
        Self { env, telemetry }
    }

    fn new(db: D) -> Self {
        Self::with_settings(db, Settings::default())
    }
}

#[tokio::test(start_paused = true)]
async fn first_page_is_trimmed_and_total_is_unknown() -> anyhow::Result<()> {
    let fixture = Fixture::new(MemoryDatabase::new(numbered_songs(1..=120, "en")));
    let search = DbSearch::new(fixture.env.clone());

    assert_eq!(RunOutcome::Applied, search.run().await?);

    let song_list = fixture.env.page().read().clone();
    assert_eq!(50, song_list.song_count());
    assert_eq!(Some(search.id()), song_list.search_id);
    assert_eq!(None, song_list.pager.total);
    assert!(song_list.pager.has_next);
    assert!(!song_list.pager.has_prev);
    assert_eq!(1, song_list.pager.first);
    assert_eq!(50, song_list.pager.last);
    assert_eq!(
        SearchState {
            phase: SearchPhase::Resolved,
            infinite_scroll: false,
        },
        search.state()
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn instant_total_is_counted_right_away() -> anyhow::Result<()> {
    let fixture = Fixture::new(MemoryDatabase::new(numbered_songs(1..=120, "en")));
    let search = DbSearch::new(fixture.env.clone());

    search.run().await?;
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(Some(120), fixture.env.page().read().pager.total);
    assert_eq!(Some(120), search.pager().total);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn inline_total_is_applied_with_results() -> anyhow::Result<()> {
    let db = MemoryDatabase::new(numbered_songs(1..=120, "en")).with_inline_total(true);
    let fixture = Fixture::new(db);
    let search = DbSearch::new(fixture.env.clone());

    search.run().await?;

    assert_eq!(Some(120), fixture.env.page().read().pager.total);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn short_result_determines_total() -> anyhow::Result<()> {
    let fixture = Fixture::new(MemoryDatabase::new(numbered_songs(1..=15, "en")));
    let search = DbSearch::new(fixture.env.clone());

    search.run().await?;

    let pager = fixture.env.page().read().pager;
    assert_eq!(Some(15), pager.total);
    assert!(!pager.has_next);
    assert!(!pager.has_prev);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn results_of_superseded_search_are_discarded() -> anyhow::Result<()> {
    let mut songs = numbered_songs(1..=30, "en");
    songs.extend(numbered_songs(31..=60, "de"));
    let db = MemoryDatabase::new(songs);
    db.set_latency(Duration::from_millis(100));
    let fixture = Fixture::new(db);

    fixture.env.filters().set_lang(Some("en".to_owned()));
    let search_a = DbSearch::new(fixture.env.clone());
    fixture.env.filters().set_lang(Some("de".to_owned()));
    let search_b = DbSearch::new(fixture.env.clone());

    let (outcome_a, outcome_b) = tokio::join!(search_a.run(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        search_b.run().await
    });

    assert_eq!(RunOutcome::Inactive, outcome_a?);
    assert_eq!(RunOutcome::Applied, outcome_b?);
    let song_list = fixture.env.page().read().clone();
    assert_eq!(Some(search_b.id()), song_list.search_id);
    assert_eq!(30, song_list.song_count());
    assert!(
        song_list
            .items
            .iter()
            .filter_map(ResultItem::song)
            .all(|song| song.lang == "de")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn late_results_of_superseded_search_do_not_overwrite() -> anyhow::Result<()> {
    let mut songs = numbered_songs(1..=30, "en");
    songs.extend(numbered_songs(31..=60, "de"));
    let db = MemoryDatabase::new(songs);
    db.set_latency(Duration::from_millis(100));
    let fixture = Fixture::new(db);

    fixture.env.filters().set_lang(Some("en".to_owned()));
    let search_a = DbSearch::new(fixture.env.clone());
    fixture.env.filters().set_lang(Some("de".to_owned()));
    let search_b = DbSearch::new(fixture.env.clone());

    // B resolves before A
    let (outcome_a, outcome_b) = tokio::join!(search_a.run(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        fixture.env.db().set_latency(Duration::ZERO);
        search_b.run().await
    });

    assert_eq!(RunOutcome::Applied, outcome_b?);
    assert_eq!(RunOutcome::Inactive, outcome_a?);
    assert_eq!(Some(search_b.id()), fixture.env.page().read().search_id);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn is_equal_compares_filters_and_validity() {
    let fixture = Fixture::new(MemoryDatabase::new(numbered_songs(1..=5, "en")));
    fixture.env.filters().set_search("grace");
    let search = DbSearch::new(fixture.env.clone());
    let db = fixture.env.db();

    assert!(search.is_equal(db, &fixture.env.filters().snapshot()));

    fixture.env.filters().set_search("amazing grace");
    assert!(!search.is_equal(db, &fixture.env.filters().snapshot()));

    fixture.env.filters().set_search("grace");
    assert!(search.is_equal(db, &fixture.env.filters().snapshot()));

    db.reload(numbered_songs(1..=5, "en"));
    assert!(!search.is_equal(db, &fixture.env.filters().snapshot()));
}

#[tokio::test(start_paused = true)]
async fn run_after_reload_is_stale() -> anyhow::Result<()> {
    let fixture = Fixture::new(MemoryDatabase::new(numbered_songs(1..=5, "en")));
    let search = DbSearch::new(fixture.env.clone());

    fixture.env.db().reload(numbered_songs(1..=3, "en"));

    assert!(matches!(search.run().await, Err(SearchError::StaleQuery)));
    assert!(fixture.env.page().read().items.is_empty());
    // No state is published for stale queries
    assert_eq!(SearchPhase::Idle, search.state().phase);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn change_page_after_reload_rebuilds_query() -> anyhow::Result<()> {
    let mut songs = numbered_songs(1..=80, "en");
    songs.extend(numbered_songs(81..=90, "de"));
    let fixture = Fixture::new(MemoryDatabase::new(songs.clone()));
    fixture.env.filters().set_lang(Some("en".to_owned()));
    let search = DbSearch::new(fixture.env.clone());
    search.run().await?;

    fixture.env.filters().set_lang(Some("de".to_owned()));
    fixture.env.db().reload(songs);

    assert_eq!(RunOutcome::Applied, search.change_page(1).await?);
    assert_eq!(Some("de".to_owned()), search.filters().lang);
    let song_list = fixture.env.page().read().clone();
    assert_eq!(10, song_list.song_count());
    assert_eq!(1, song_list.pager.first);
    assert!(search.is_query_valid());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn rebuilt_superseded_search_stays_inactive() -> anyhow::Result<()> {
    let songs = numbered_songs(1..=80, "en");
    let fixture = Fixture::new(MemoryDatabase::new(songs.clone()));
    let search_a = DbSearch::new(fixture.env.clone());
    search_a.run().await?;
    let search_b = DbSearch::new(fixture.env.clone());
    search_b.run().await?;

    fixture.env.db().reload(songs);

    assert_eq!(RunOutcome::Inactive, search_a.change_page(1).await?);
    assert!(search_a.is_query_valid());
    assert!(fixture.env.page().is_active(search_b.id()));
    assert_eq!(Some(search_b.id()), fixture.env.page().read().search_id);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn change_page_moves_forward_and_back() -> anyhow::Result<()> {
    let fixture = Fixture::new(MemoryDatabase::new(numbered_songs(1..=120, "en")));
    let search = DbSearch::new(fixture.env.clone());
    search.run().await?;

    assert_eq!(RunOutcome::Applied, search.change_page(1).await?);
    {
        let song_list = fixture.env.page().read();
        assert_eq!(51, song_list.pager.first);
        assert_eq!(100, song_list.pager.last);
        assert!(song_list.pager.has_prev);
        assert_eq!(Some(SongId(51)), song_list.items[0].song().map(|song| song.id));
    }

    assert_eq!(RunOutcome::Unchanged, search.change_page(0).await?);

    assert_eq!(RunOutcome::Applied, search.change_page(-1).await?);
    assert_eq!(1, fixture.env.page().read().pager.first);
    assert_eq!(RunOutcome::Unchanged, search.change_page(-1).await?);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn infinite_scroll_appends_until_limit() -> anyhow::Result<()> {
    let settings = Settings {
        scroll_limit: 60,
        ..Default::default()
    };
    let fixture = Fixture::with_settings(
        MemoryDatabase::new(numbered_songs(1..=300, "en")),
        settings,
    );
    let search = DbSearch::new(fixture.env.clone());
    search.run().await?;

    assert_eq!(RunOutcome::Applied, search.infinite_scroll().await?);
    assert!(search.state().infinite_scroll);
    assert_eq!(RunOutcome::Applied, search.infinite_scroll().await?);
    assert_eq!(150, fixture.env.page().read().song_count());

    assert!(matches!(
        search.infinite_scroll().await,
        Err(SearchError::CannotScroll)
    ));
    assert_eq!(150, fixture.env.page().read().song_count());

    // Moving back is relative to the last manually selected page
    assert_eq!(RunOutcome::Unchanged, search.change_page(-1).await?);
    assert_eq!(RunOutcome::Applied, search.change_page(1).await?);
    assert_eq!(50, fixture.env.page().read().song_count());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn overshoot_is_discarded() -> anyhow::Result<()> {
    let db = MemoryDatabase::new(numbered_songs(1..=60, "en"));
    for id in 1..=60 {
        db.set_favourite(SongId(id), true);
    }
    let fixture = Fixture::new(db);
    fixture.env.filters().set_search("fav=1");
    let search = DbSearch::new(fixture.env.clone());
    search.run().await?;
    let before = fixture.env.page().read().clone();
    assert_eq!(50, before.song_count());

    // Shrink the data without changing its validity
    for id in 1..=60 {
        fixture.env.db().set_favourite(SongId(id), false);
    }

    assert_eq!(RunOutcome::Overshoot, search.change_page(1).await?);
    assert_eq!(before, *fixture.env.page().read());
    assert_eq!(SearchPhase::Resolved, search.state().phase);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn meta_matches_are_prepended_to_first_page() -> anyhow::Result<()> {
    let songs = (1..=60)
        .map(|id| song(id, &format!("Grace {id}"), "en"))
        .collect();
    let db = MemoryDatabase::new(songs).with_sources(vec![Source {
        id: SourceId(1),
        name: "Songs of Grace".to_owned(),
        abbreviation: Some("SoG".to_owned()),
    }]);
    let fixture = Fixture::new(db);
    fixture.env.filters().set_search("GRÂCE");
    let search = DbSearch::new(fixture.env.clone());

    search.run().await?;
    {
        let song_list = fixture.env.page().read();
        assert_eq!(ResultKind::Source, song_list.items[0].kind());
        assert_eq!(51, song_list.items.len());
        assert_eq!(50, song_list.song_count());
        assert_eq!(50, song_list.pager.last);
    }

    search.change_page(1).await?;
    {
        let song_list = fixture.env.page().read();
        assert!(song_list.items.iter().all(ResultItem::is_song));
        assert_eq!(10, song_list.song_count());
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn no_meta_matches_when_filtered_by_source() -> anyhow::Result<()> {
    let songs = (1..=5)
        .map(|id| Song {
            source_id: Some(SourceId(1)),
            ..song(id, "Grace", "en")
        })
        .collect();
    let db = MemoryDatabase::new(songs).with_sources(vec![Source {
        id: SourceId(1),
        name: "Grace".to_owned(),
        abbreviation: None,
    }]);
    let fixture = Fixture::new(db);
    fixture.env.filters().set_search("grace");
    fixture.env.filters().set_source(SourceId(1), true);
    let search = DbSearch::new(fixture.env.clone());

    search.run().await?;

    let song_list = fixture.env.page().read();
    assert_eq!(5, song_list.items.len());
    assert!(song_list.items.iter().all(ResultItem::is_song));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_query_defers_total() -> anyhow::Result<()> {
    let db = MemoryDatabase::new(numbered_songs(1..=120, "en")).with_instant_total(false);
    db.set_latency(Duration::from_millis(200));
    let fixture = Fixture::new(db);
    let search = DbSearch::new(fixture.env.clone());

    search.run().await?;

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(None, fixture.env.page().read().pager.total);

    // 1500 ms delay + 200 ms latency
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(Some(120), fixture.env.page().read().pager.total);
    assert!(fixture.env.page().read().pager.has_next);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn deferred_total_is_cancelled_by_next_run() -> anyhow::Result<()> {
    let db = MemoryDatabase::new(numbered_songs(1..=120, "en")).with_instant_total(false);
    db.set_latency(Duration::from_millis(200));
    let fixture = Fixture::new(db);
    let search = DbSearch::new(fixture.env.clone());

    search.run().await?;
    search.change_page(1).await?;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(None, fixture.env.page().read().pager.total);
    assert_eq!(None, search.pager().total);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn deferred_total_is_cancelled_on_drop() -> anyhow::Result<()> {
    let db = MemoryDatabase::new(numbered_songs(1..=120, "en")).with_instant_total(false);
    db.set_latency(Duration::from_millis(200));
    let fixture = Fixture::new(db);
    let search = DbSearch::new(fixture.env.clone());

    search.run().await?;
    drop(search);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(None, fixture.env.page().read().pager.total);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn running_state_is_published_before_results() -> anyhow::Result<()> {
    let db = MemoryDatabase::new(numbered_songs(1..=10, "en"));
    db.set_latency(Duration::from_millis(50));
    let fixture = Fixture::new(db);
    let search = DbSearch::new(fixture.env.clone());
    let mut state_sub = search.subscribe_state();
    assert_eq!(SearchPhase::Idle, state_sub.read_ack().phase);

    let (outcome, observed) = tokio::join!(search.run(), async {
        state_sub.changed().await.ok();
        let state = *state_sub.read_ack();
        let song_count = fixture.env.page().read().song_count();
        (state, song_count)
    });

    assert_eq!(RunOutcome::Applied, outcome?);
    assert!(observed.0.is_running());
    assert_eq!(0, observed.1);
    assert_eq!(10, fixture.env.page().read().song_count());
    assert_eq!(SearchPhase::Resolved, search.state().phase);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn telemetry_strips_defaults() -> anyhow::Result<()> {
    let fixture = Fixture::new(MemoryDatabase::new(numbered_songs(1..=120, "en")));
    let search = DbSearch::new(fixture.env.clone());

    search.run().await?;
    search.infinite_scroll().await?;

    let events = fixture.telemetry.drain();
    assert_eq!(2, events.len());
    let first = events[0].as_object().expect("object");
    assert!(!first.contains_key("search"));
    assert!(!first.contains_key("order_by"));
    assert!(!first.contains_key("start"));
    assert!(!first.contains_key("infinite_scroll"));
    assert!(!first.contains_key("failed"));
    assert!(first.contains_key("elapsed_ms"));
    let second = events[1].as_object().expect("object");
    assert_eq!(Some(&serde_json::json!(50)), second.get("start"));
    assert_eq!(Some(&serde_json::json!(true)), second.get("infinite_scroll"));
    Ok(())
}

struct FailingDatabase;

impl Database for FailingDatabase {
    type Validity = ();

    type PreparedQuery = ();

    fn query_validity(&self) -> Self::Validity {}

    fn prepare_query(
        &self,
        _filters: &Filters,
        _search: &str,
    ) -> impl Future<Output = anyhow::Result<Self::PreparedQuery>> + Send {
        future::ready(Ok(()))
    }

    fn run_search(
        &self,
        _query: &Self::PreparedQuery,
        _requested: RequestedItems,
    ) -> impl Future<Output = anyhow::Result<SearchResponse>> + Send {
        future::ready(Err(anyhow::anyhow!("offline")))
    }

    fn search_meta(
        &self,
        _filters: &Filters,
        _search: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<MetaEntity>>> + Send {
        future::ready(Ok(Vec::new()))
    }

    fn get_total(
        &self,
        _query: &Self::PreparedQuery,
    ) -> impl Future<Output = anyhow::Result<usize>> + Send {
        future::ready(Ok(0))
    }

    fn add_timing_stat(&self, _elapsed: Duration) {}

    fn instant_total_query(&self) -> bool {
        true
    }
}

#[tokio::test(start_paused = true)]
async fn database_failure_propagates() {
    let fixture = Fixture::new(FailingDatabase);
    fixture.env.filters().set_search("grace");
    let search = DbSearch::new(fixture.env.clone());

    let result = search.run().await;

    assert!(matches!(result, Err(SearchError::Database(_))));
    assert_eq!(SearchPhase::Resolved, search.state().phase);
    assert!(fixture.env.page().read().items.is_empty());
    let events = fixture.telemetry.drain();
    assert_eq!(1, events.len());
    assert_eq!(Some(&serde_json::json!(true)), events[0].get("failed"));
    assert_eq!(Some(&serde_json::json!("grace")), events[0].get("search"));
}
