use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use atlas_stats::aggregate::Metric;
use atlas_stats::cache::GameCache;
use atlas_stats::clean::Cleaner;
use atlas_stats::ingest::{JsonExportSource, RecordSource, ingest, parse_export_json};
use atlas_stats::report::{
    build_and_write_all, build_report_set, card_stats, commander_stats, matchups, player_stats,
};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn export_source_reads_array_and_scan_shapes() {
    let items = JsonExportSource::new(fixture_path("raw_games.json"))
        .fetch()
        .expect("array export should read");
    assert_eq!(items.len(), 8);

    let scanned = JsonExportSource::new(fixture_path("scan_export.json"))
        .fetch()
        .expect("scan export should read");
    assert_eq!(scanned.len(), 2);
}

#[test]
fn export_parse_edge_cases() {
    assert!(parse_export_json("null").unwrap().is_empty());
    assert!(parse_export_json("  ").unwrap().is_empty());
    assert!(parse_export_json(r#"{"Count": 0}"#).is_err());
    assert!(parse_export_json("42").is_err());
    assert!(parse_export_json("[[[").is_err());
}

#[test]
fn missing_export_is_an_error() {
    let source = JsonExportSource::new(fixture_path("does_not_exist.json"));
    assert!(source.fetch().is_err());
}

#[test]
fn ingest_is_incremental_and_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let cache = GameCache::new(dir.path().join("cache.json"));
    let source = JsonExportSource::new(fixture_path("raw_games.json"));
    let cleaner = Cleaner::default();

    let first = ingest(&source, &cache, &cleaner).expect("first ingest");
    assert_eq!(first.fetched, 8);
    assert_eq!(first.already_cached, 0);
    assert_eq!(first.accepted, 2);
    assert_eq!(first.rejected_total(), 6);
    assert_eq!(first.total_cached, 2);

    let second = ingest(&source, &cache, &cleaner).expect("second ingest");
    assert_eq!(second.already_cached, 2);
    assert_eq!(second.accepted, 0);
    assert_eq!(second.total_cached, 2);

    let loaded = cache.load();
    assert_eq!(loaded.ids.len(), 2);
    assert!(loaded.ids.contains("g-001"));
    assert!(loaded.ids.contains("g-002"));
}

#[test]
fn ingest_recovers_from_corrupted_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, "not json at all").unwrap();
    let cache = GameCache::new(&path);

    let summary = ingest(
        &JsonExportSource::new(fixture_path("raw_games.json")),
        &cache,
        &Cleaner::default(),
    )
    .unwrap();
    assert_eq!(summary.already_cached, 0);
    assert_eq!(cache.load().games.len(), 2);
}

#[test]
fn ingest_accepts_in_memory_records() {
    let dir = tempfile::tempdir().unwrap();
    let cache = GameCache::new(dir.path().join("cache.json"));
    let players = json!({
        "numPlayers": 2,
        "players": [
            {"name": "A", "winner": true, "turnsTaken": 5, "decklist": {"_commander": "X"}},
            {"name": "B", "winner": false, "turnsTaken": 5, "decklist": {"_commander": "Y"}}
        ]
    });
    let raws: Vec<Value> = vec![
        json!({"gameid": "m-1", "firstPlayer": "1", "players": players.clone()}),
        json!({"gameid": "m-1", "firstPlayer": "1", "players": players}),
    ];
    let summary = ingest(&raws, &cache, &Cleaner::default()).unwrap();
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.total_cached, 1);
}

#[test]
fn numeric_gameid_counts_as_already_cached() {
    let dir = tempfile::tempdir().unwrap();
    let cache = GameCache::new(dir.path().join("cache.json"));
    let players = json!({
        "numPlayers": 2,
        "players": [
            {"name": "A", "winner": true, "turnsTaken": 5, "decklist": {"_commander": "X"}},
            {"name": "B", "winner": false, "turnsTaken": 5, "decklist": {"_commander": "Y"}}
        ]
    });
    let raws: Vec<Value> = vec![json!({"gameid": 42, "firstPlayer": "1", "players": players})];

    let first = ingest(&raws, &cache, &Cleaner::default()).unwrap();
    assert_eq!(first.accepted, 1);
    assert!(cache.load().ids.contains("42"));

    let second = ingest(&raws, &cache, &Cleaner::default()).unwrap();
    assert_eq!(second.already_cached, 1);
    assert_eq!(second.accepted, 0);
    assert_eq!(second.total_cached, 1);
}

#[test]
fn report_set_from_ingested_games() {
    let items = parse_export_json(&fs::read_to_string(fixture_path("raw_games.json")).unwrap()).unwrap();
    let games = Cleaner::default().clean_batch(&items).games;
    let refs = games.iter().collect::<Vec<_>>();
    let now = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();

    let all = build_report_set(&refs, None, "all", now);
    assert_eq!(all.metadata.total_matches, 2);
    assert_eq!(all.metadata.total_players, 4);
    assert_eq!(all.metrics.len(), 3);

    let dunes_week = build_report_set(&refs, Some(7), "Dunes", now);
    assert_eq!(dunes_week.metadata.total_matches, 1);
    let duration = dunes_week
        .metrics
        .iter()
        .find(|(m, _)| *m == Metric::DurationMinutes)
        .map(|(_, r)| r)
        .unwrap();
    // 25 minutes lands in 20-30.
    assert_eq!(duration.commanders["Old Name"][2].games, 1);

    let stale = build_report_set(&refs, Some(1), "all", now);
    assert_eq!(stale.metadata.total_matches, 0);
    assert!(stale.commander_stats.is_empty());
}

#[test]
fn commander_stats_sorted_by_matches() {
    let items = parse_export_json(&fs::read_to_string(fixture_path("raw_games.json")).unwrap()).unwrap();
    let games = Cleaner::default().clean_batch(&items).games;
    let refs = games.iter().collect::<Vec<_>>();
    let rows = commander_stats(&refs);
    assert_eq!(rows[0].name, "Elyse");
    assert_eq!(rows[0].matches, 2);
    assert_eq!(rows[0].wins, 1);
    assert_eq!(rows[0].winrate, Some(0.5));
    let names = rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Elyse", "Old Name", "Vorn"]);
}

#[test]
fn matchups_pair_every_opponent_both_ways() {
    let items = parse_export_json(&fs::read_to_string(fixture_path("raw_games.json")).unwrap()).unwrap();
    let games = Cleaner::default().clean_batch(&items).games;
    let refs = games.iter().collect::<Vec<_>>();

    let report = matchups(&refs);
    assert_eq!(report.commanders, vec!["Elyse", "Old Name", "Vorn"]);
    let rows = report
        .matchups
        .iter()
        .map(|m| (m.commander.as_str(), m.opponent.as_str(), m.wins, m.losses, m.total))
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![
            ("Elyse", "Old Name", 0, 1, 1),
            ("Elyse", "Vorn", 1, 0, 1),
            ("Old Name", "Elyse", 1, 0, 1),
            ("Vorn", "Elyse", 0, 1, 1),
        ]
    );
    assert_eq!(report.matchups[1].winrate, Some(1.0));
}

#[test]
fn matchups_skip_mirrors() {
    let mut items = parse_export_json(&fs::read_to_string(fixture_path("raw_games.json")).unwrap()).unwrap();
    items.truncate(2);
    let mut games = Cleaner::default().clean_batch(&items).games;
    for player in &mut games[1].players {
        player.commander = "Elyse".to_string();
    }
    let refs = games.iter().collect::<Vec<_>>();

    let report = matchups(&refs);
    assert_eq!(report.commanders, vec!["Elyse", "Old Name"]);
    assert_eq!(report.matchups.len(), 2);
}

#[test]
fn player_leaderboard_counts_games_and_wins() {
    let items = parse_export_json(&fs::read_to_string(fixture_path("raw_games.json")).unwrap()).unwrap();
    let mut games = Cleaner::default().clean_batch(&items).games;
    games[1].players[0].name = "Ash".to_string();
    let refs = games.iter().collect::<Vec<_>>();

    let rows = player_stats(&refs);
    let names = rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Ash", "Birch", "Dune"]);
    assert_eq!(rows[0].games, 2);
    assert_eq!(rows[0].wins, 2);
    assert_eq!(rows[0].winrate, Some(1.0));
    assert_eq!(rows[2].winrate, Some(0.0));
}

#[test]
fn card_stats_count_presence_per_player_game() {
    let items = parse_export_json(&fs::read_to_string(fixture_path("raw_games.json")).unwrap()).unwrap();
    let games = Cleaner::default().clean_batch(&items).games;
    let refs = games.iter().collect::<Vec<_>>();

    let rows = card_stats(&refs);
    let names = rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Fire Bolt", "Legacy Card"]);

    let bolt = &rows[0];
    assert_eq!(bolt.deck_count, 1);
    assert_eq!(bolt.deck_rate, 0.25);
    assert_eq!(bolt.deck_winrate, Some(1.0));
    assert_eq!(bolt.drawn_count, 1);
    assert_eq!(bolt.played_count, 0);
    assert_eq!(bolt.played_rate, 0.0);
    assert_eq!(bolt.played_winrate, None);

    let legacy = &rows[1];
    assert_eq!(legacy.deck_count, 1);
    assert_eq!(legacy.drawn_count, 0);
    assert_eq!(legacy.played_count, 1);
    assert_eq!(legacy.played_winrate, Some(1.0));

    assert!(card_stats(&[]).is_empty());
}

#[test]
fn writes_all_time_and_windowed_reports() {
    let dir = tempfile::tempdir().unwrap();
    let items = parse_export_json(&fs::read_to_string(fixture_path("raw_games.json")).unwrap()).unwrap();
    let games = Cleaner::default().clean_batch(&items).games;

    let written = build_and_write_all(&games, &[30], "all", dir.path()).unwrap();
    assert_eq!(written.len(), 16);
    for name in [
        "metadata.json",
        "commander_stats.json",
        "matchups.json",
        "players.json",
        "card_stats.json",
        "duration_winrates.json",
        "action_winrates.json",
        "turn_winrates.json",
    ] {
        assert!(dir.path().join(name).exists(), "{name}");
        assert!(dir.path().join("30d").join(name).exists(), "30d/{name}");
    }

    let raw = fs::read_to_string(dir.path().join("turn_winrates.json")).unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert!(doc["commanders"]["Vorn"].is_array());
    let meta: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("metadata.json")).unwrap()).unwrap();
    assert_eq!(meta["total_matches"], 2);
    assert_eq!(meta["data_version"], "0.1.0");

    let doc: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("matchups.json")).unwrap()).unwrap();
    assert_eq!(doc["commanders"][0], "Elyse");
    assert_eq!(doc["matchups"][0]["opponent"], "Old Name");
    assert_eq!(doc["matchups"][0]["losses"], 1);
    let doc: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("card_stats.json")).unwrap()).unwrap();
    assert_eq!(doc[0]["name"], "Fire Bolt");
    assert_eq!(doc[0]["drawn_rate"], 0.25);
    assert!(doc[0]["played_winrate"].is_null());
}
