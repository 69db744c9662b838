use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{CanonicalGame, PlayerRecord};

pub const DURATION_BOUNDARIES: &[f64] = &[0.0, 10.0, 20.0, 30.0];
pub const ACTION_BOUNDARIES: &[f64] = &[0.0, 30.0, 60.0, 90.0];
pub const TURN_BOUNDARIES: &[f64] = &[1.0, 5.0, 8.0, 11.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    DurationMinutes,
    Actions,
    Turns,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::DurationMinutes, Metric::Actions, Metric::Turns];

    /// Duration is a per-game value shared by both players.
    pub fn value(self, game: &CanonicalGame, player: &PlayerRecord) -> Option<f64> {
        match self {
            Metric::DurationMinutes => game.duration_minutes,
            Metric::Actions => Some(player.actions as f64),
            Metric::Turns => Some(player.turns as f64),
        }
    }

    pub fn report_file(self) -> &'static str {
        match self {
            Metric::DurationMinutes => "duration_winrates.json",
            Metric::Actions => "action_winrates.json",
            Metric::Turns => "turn_winrates.json",
        }
    }
}

/// Ascending lower edges. Every bucket is `[edge, next_edge)`; the last one
/// is unbounded above.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSpec {
    boundaries: Vec<f64>,
}

impl BucketSpec {
    /// Returns `None` unless the edges are finite and strictly ascending.
    pub fn new(boundaries: Vec<f64>) -> Option<Self> {
        if boundaries.is_empty() || boundaries.iter().any(|b| !b.is_finite()) {
            return None;
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }
        Some(Self { boundaries })
    }

    pub fn for_metric(metric: Metric) -> Self {
        let boundaries = match metric {
            Metric::DurationMinutes => DURATION_BOUNDARIES,
            Metric::Actions => ACTION_BOUNDARIES,
            Metric::Turns => TURN_BOUNDARIES,
        };
        Self {
            boundaries: boundaries.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Index of the greatest edge `<= value`. A value sitting exactly on an
    /// edge belongs to the bucket that starts there.
    pub fn bucket_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let above = self.boundaries.partition_point(|edge| *edge <= value);
        above.checked_sub(1)
    }

    pub fn labels(&self) -> Vec<String> {
        self.boundaries
            .iter()
            .enumerate()
            .map(|(idx, lo)| match self.boundaries.get(idx + 1) {
                Some(hi) => format!("{lo}-{hi}"),
                None => format!("{lo}+"),
            })
            .collect()
    }

    fn empty_buckets(&self) -> Vec<Bucket> {
        self.labels()
            .into_iter()
            .map(|range_label| Bucket {
                range_label,
                games: 0,
                wins: 0,
                winrate: None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub range_label: String,
    pub games: u32,
    pub wins: u32,
    pub winrate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketReport {
    pub commanders: BTreeMap<String, Vec<Bucket>>,
}

/// Per-commander win/loss tallies over `metric` buckets.
///
/// Each player counts once toward their commander's bucket. Players without
/// a commander, and values missing or below the first edge, are left out.
/// Output ordering is fixed so repeated runs serialize identically.
pub fn aggregate_by_metric(
    games: &[&CanonicalGame],
    metric: Metric,
    spec: &BucketSpec,
) -> BucketReport {
    let mut commanders: BTreeMap<String, Vec<Bucket>> = BTreeMap::new();

    for game in games {
        for player in &game.players {
            if player.commander.is_empty() {
                continue;
            }
            let Some(idx) = metric
                .value(game, player)
                .and_then(|value| spec.bucket_index(value))
            else {
                continue;
            };
            let buckets = commanders
                .entry(player.commander.clone())
                .or_insert_with(|| spec.empty_buckets());
            let bucket = &mut buckets[idx];
            bucket.games += 1;
            if player.winner {
                bucket.wins += 1;
            }
        }
    }

    for buckets in commanders.values_mut() {
        for bucket in buckets.iter_mut() {
            bucket.winrate = winrate(bucket.wins, bucket.games);
        }
    }

    BucketReport { commanders }
}

pub fn aggregate_duration_winrates(games: &[&CanonicalGame]) -> BucketReport {
    let metric = Metric::DurationMinutes;
    aggregate_by_metric(games, metric, &BucketSpec::for_metric(metric))
}

pub fn aggregate_action_winrates(games: &[&CanonicalGame]) -> BucketReport {
    let metric = Metric::Actions;
    aggregate_by_metric(games, metric, &BucketSpec::for_metric(metric))
}

pub fn aggregate_turn_winrates(games: &[&CanonicalGame]) -> BucketReport {
    let metric = Metric::Turns;
    aggregate_by_metric(games, metric, &BucketSpec::for_metric(metric))
}

pub fn winrate(wins: u32, games: u32) -> Option<f64> {
    (games > 0).then(|| f64::from(wins) / f64::from(games))
}
