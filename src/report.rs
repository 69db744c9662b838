use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::aggregate::{BucketReport, BucketSpec, Metric, aggregate_by_metric, winrate};
use crate::cache::write_atomic;
use crate::filter::{filter_by_map, filter_by_period_at};
use crate::model::{CanonicalGame, CardEntry};

pub const DATA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommanderStat {
    pub name: String,
    pub matches: u32,
    pub wins: u32,
    pub winrate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub last_updated: String,
    pub total_matches: usize,
    pub total_players: usize,
    pub data_version: &'static str,
}

/// One row of the head-to-head heatmap, seen from `commander`'s side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matchup {
    pub commander: String,
    pub opponent: String,
    pub wins: u32,
    pub losses: u32,
    pub total: u32,
    pub winrate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchupReport {
    pub commanders: Vec<String>,
    pub matchups: Vec<Matchup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStat {
    pub name: String,
    pub games: u32,
    pub wins: u32,
    pub winrate: Option<f64>,
}

/// Per-card presence counts. A card counts once per player-game in each
/// list it shows up in, whatever its copy count; rates are over all
/// player-games in the slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardStat {
    pub name: String,
    pub deck_count: u32,
    pub deck_rate: f64,
    pub deck_winrate: Option<f64>,
    pub drawn_count: u32,
    pub drawn_rate: f64,
    pub drawn_winrate: Option<f64>,
    pub played_count: u32,
    pub played_rate: f64,
    pub played_winrate: Option<f64>,
}

/// Everything the front end reads for one period/map slice.
#[derive(Debug, Clone)]
pub struct ReportSet {
    pub period_days: Option<u32>,
    pub metadata: Metadata,
    pub commander_stats: Vec<CommanderStat>,
    pub matchups: MatchupReport,
    pub players: Vec<PlayerStat>,
    pub card_stats: Vec<CardStat>,
    pub metrics: Vec<(Metric, BucketReport)>,
}

pub fn commander_stats(games: &[&CanonicalGame]) -> Vec<CommanderStat> {
    let mut tally: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for player in games.iter().flat_map(|g| g.players.iter()) {
        if player.commander.is_empty() {
            continue;
        }
        let entry = tally.entry(player.commander.as_str()).or_default();
        entry.0 += 1;
        if player.winner {
            entry.1 += 1;
        }
    }

    let mut rows = tally
        .into_iter()
        .map(|(name, (matches, wins))| CommanderStat {
            name: name.to_string(),
            matches,
            wins,
            winrate: winrate(wins, matches),
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.matches.cmp(&a.matches).then_with(|| a.name.cmp(&b.name)));
    rows
}

/// Every ordered pair of players with different commanders in a game adds
/// one result to `commander` vs `opponent`. Mirror matches are skipped.
pub fn matchups(games: &[&CanonicalGame]) -> MatchupReport {
    let mut tally: BTreeMap<(&str, &str), (u32, u32)> = BTreeMap::new();
    for game in games {
        for (idx, player) in game.players.iter().enumerate() {
            for (other_idx, opponent) in game.players.iter().enumerate() {
                if idx == other_idx
                    || player.commander.is_empty()
                    || opponent.commander.is_empty()
                    || player.commander == opponent.commander
                {
                    continue;
                }
                let entry = tally
                    .entry((player.commander.as_str(), opponent.commander.as_str()))
                    .or_default();
                entry.0 += 1;
                if player.winner {
                    entry.1 += 1;
                }
            }
        }
    }

    let mut commanders = BTreeSet::new();
    let matchups = tally
        .into_iter()
        .map(|((commander, opponent), (total, wins))| {
            commanders.insert(commander);
            commanders.insert(opponent);
            Matchup {
                commander: commander.to_string(),
                opponent: opponent.to_string(),
                wins,
                losses: total - wins,
                total,
                winrate: winrate(wins, total),
            }
        })
        .collect::<Vec<_>>();

    MatchupReport {
        commanders: commanders.into_iter().map(str::to_string).collect(),
        matchups,
    }
}

/// Leaderboard rows, most games first.
pub fn player_stats(games: &[&CanonicalGame]) -> Vec<PlayerStat> {
    let mut tally: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for player in games.iter().flat_map(|g| g.players.iter()) {
        let entry = tally.entry(player.name.as_str()).or_default();
        entry.0 += 1;
        if player.winner {
            entry.1 += 1;
        }
    }

    let mut rows = tally
        .into_iter()
        .map(|(name, (games, wins))| PlayerStat {
            name: name.to_string(),
            games,
            wins,
            winrate: winrate(wins, games),
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.games.cmp(&a.games).then_with(|| a.name.cmp(&b.name)));
    rows
}

#[derive(Default)]
struct CardTally {
    deck: (u32, u32),
    drawn: (u32, u32),
    played: (u32, u32),
}

pub fn card_stats(games: &[&CanonicalGame]) -> Vec<CardStat> {
    fn mark<'a>(
        tally: &mut BTreeMap<&'a str, CardTally>,
        cards: &'a [CardEntry],
        winner: bool,
        slot: fn(&mut CardTally) -> &mut (u32, u32),
    ) {
        let distinct = cards.iter().map(|c| c.name.as_str()).collect::<HashSet<_>>();
        for name in distinct {
            let counts = slot(tally.entry(name).or_default());
            counts.0 += 1;
            if winner {
                counts.1 += 1;
            }
        }
    }

    let mut tally: BTreeMap<&str, CardTally> = BTreeMap::new();
    let mut player_games = 0u32;
    for player in games.iter().flat_map(|g| g.players.iter()) {
        player_games += 1;
        mark(&mut tally, &player.cards_in_deck, player.winner, |t| &mut t.deck);
        mark(&mut tally, &player.cards_drawn, player.winner, |t| &mut t.drawn);
        mark(&mut tally, &player.cards_played, player.winner, |t| &mut t.played);
    }

    let rate = |count: u32| {
        if player_games == 0 {
            0.0
        } else {
            f64::from(count) / f64::from(player_games)
        }
    };
    tally
        .into_iter()
        .map(|(name, t)| CardStat {
            name: name.to_string(),
            deck_count: t.deck.0,
            deck_rate: rate(t.deck.0),
            deck_winrate: winrate(t.deck.1, t.deck.0),
            drawn_count: t.drawn.0,
            drawn_rate: rate(t.drawn.0),
            drawn_winrate: winrate(t.drawn.1, t.drawn.0),
            played_count: t.played.0,
            played_rate: rate(t.played.0),
            played_winrate: winrate(t.played.1, t.played.0),
        })
        .collect()
}

pub fn metadata(games: &[&CanonicalGame], now: DateTime<Utc>) -> Metadata {
    let players = games
        .iter()
        .flat_map(|g| g.players.iter())
        .map(|p| p.name.as_str())
        .collect::<HashSet<_>>();
    Metadata {
        last_updated: now.to_rfc3339(),
        total_matches: games.len(),
        total_players: players.len(),
        data_version: DATA_VERSION,
    }
}

pub fn build_report_set(
    games: &[&CanonicalGame],
    period_days: Option<u32>,
    map_name: &str,
    now: DateTime<Utc>,
) -> ReportSet {
    let in_period = filter_by_period_at(games, period_days, now);
    let selected = filter_by_map(&in_period, map_name);

    let metrics = Metric::ALL
        .iter()
        .map(|metric| {
            let spec = BucketSpec::for_metric(*metric);
            (*metric, aggregate_by_metric(&selected, *metric, &spec))
        })
        .collect();

    ReportSet {
        period_days,
        metadata: metadata(&selected, now),
        commander_stats: commander_stats(&selected),
        matchups: matchups(&selected),
        players: player_stats(&selected),
        card_stats: card_stats(&selected),
        metrics,
    }
}

/// All-time reports go to `data_dir`, windowed ones to `data_dir/<N>d`.
pub fn report_dir(data_dir: &Path, period_days: Option<u32>) -> PathBuf {
    match period_days {
        Some(days) => data_dir.join(format!("{days}d")),
        None => data_dir.to_path_buf(),
    }
}

pub fn write_report_set(data_dir: &Path, set: &ReportSet) -> Result<Vec<PathBuf>> {
    let dir = report_dir(data_dir, set.period_days);
    fs::create_dir_all(&dir).with_context(|| format!("create report dir {}", dir.display()))?;

    let mut written = Vec::new();
    written.push(write_json(&dir, "metadata.json", &set.metadata)?);
    written.push(write_json(&dir, "commander_stats.json", &set.commander_stats)?);
    written.push(write_json(&dir, "matchups.json", &set.matchups)?);
    written.push(write_json(&dir, "players.json", &set.players)?);
    written.push(write_json(&dir, "card_stats.json", &set.card_stats)?);
    for (metric, report) in &set.metrics {
        written.push(write_json(&dir, metric.report_file(), report)?);
    }
    info!(
        dir = %dir.display(),
        matches = set.metadata.total_matches,
        files = written.len(),
        "reports written"
    );
    Ok(written)
}

/// Builds and writes the all-time set plus one set per window.
pub fn build_and_write_all(
    games: &[CanonicalGame],
    periods: &[u32],
    map_name: &str,
    data_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let now = Utc::now();
    let refs = games.iter().collect::<Vec<_>>();
    let windows = std::iter::once(None).chain(periods.iter().copied().map(Some));

    let mut written = Vec::new();
    for period_days in windows {
        let set = build_report_set(&refs, period_days, map_name, now);
        written.extend(write_report_set(data_dir, &set)?);
    }
    Ok(written)
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, filename: &str, data: &T) -> Result<PathBuf> {
    let path = dir.join(filename);
    let json = serde_json::to_string_pretty(data)
        .with_context(|| format!("serialize {filename}"))?;
    write_atomic(&path, &json)?;
    Ok(path)
}
