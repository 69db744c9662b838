use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use crate::coerce::{
    DEFAULT_ACTIONS, DEFAULT_TURNS, bool_or_false, count_or_default, int_or, text_or,
};
use crate::model::{CanonicalGame, CardEntry, PlayerRecord};
use crate::normalize::Normalizer;
use crate::parse::{parse_datetime, parse_players_payload};

pub const DEFAULT_MIN_TURNS: i64 = 3;

/// Why a raw record did not become a canonical game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rejection {
    FirstPlayerZero,
    NoPlayersData,
    NumPlayersBelowTwo,
    PlayerListBelowTwo,
    LowTurns,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::FirstPlayerZero => "first_player=0",
            Rejection::NoPlayersData => "no_players_data",
            Rejection::NumPlayersBelowTwo => "num_players_below_2",
            Rejection::PlayerListBelowTwo => "player_list_below_2",
            Rejection::LowTurns => "low_turns",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
pub struct CleanReport {
    pub games: Vec<CanonicalGame>,
    pub rejected: BTreeMap<&'static str, usize>,
}

impl CleanReport {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

#[derive(Debug, Clone)]
pub struct Cleaner {
    normalizer: Normalizer,
    min_turns: i64,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(Normalizer::default(), DEFAULT_MIN_TURNS)
    }
}

impl Cleaner {
    pub fn new(normalizer: Normalizer, min_turns: i64) -> Self {
        Self {
            normalizer,
            min_turns,
        }
    }

    pub fn min_turns(&self) -> i64 {
        self.min_turns
    }

    /// Runs the validation gates in order; the first failing gate decides
    /// the rejection.
    pub fn clean_game(&self, raw: &Value) -> Result<CanonicalGame, Rejection> {
        // An explicit null reads like a missing field, so `first_player`
        // is never empty or "null".
        let first_player = text_or(raw.get("firstPlayer"), "0");
        if first_player == "0" {
            return Err(Rejection::FirstPlayerZero);
        }

        let payload = raw.get("players").and_then(parse_players_payload);
        let Some(payload) = payload.as_ref().and_then(Value::as_object) else {
            return Err(Rejection::NoPlayersData);
        };
        if payload.is_empty() {
            return Err(Rejection::NoPlayersData);
        }

        if int_or(payload.get("numPlayers"), 0) < 2 {
            return Err(Rejection::NumPlayersBelowTwo);
        }

        let raw_players = payload
            .get("players")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if raw_players.len() < 2 {
            return Err(Rejection::PlayerListBelowTwo);
        }

        if raw_players
            .iter()
            .any(|p| int_or(p.get("turnsTaken"), DEFAULT_TURNS) < self.min_turns)
        {
            return Err(Rejection::LowTurns);
        }

        let dt_end = raw.get("datetime").and_then(Value::as_str).and_then(parse_datetime);
        let dt_start = raw
            .get("datetimeStarted")
            .and_then(Value::as_str)
            .and_then(parse_datetime);
        let duration_minutes = match (dt_start, dt_end) {
            (Some(start), Some(end)) => {
                let secs = (end - start).num_seconds();
                (secs > 0).then(|| round_tenths(secs as f64 / 60.0))
            }
            _ => None,
        };

        Ok(CanonicalGame {
            game_id: text_or(raw.get("gameid"), ""),
            datetime: dt_end,
            datetime_started: dt_start,
            duration_minutes,
            map: text_or(raw.get("map"), ""),
            format: text_or(raw.get("format"), ""),
            first_player,
            players: raw_players.iter().map(|p| self.build_player(p)).collect(),
        })
    }

    /// Cleans every record and tallies rejections by reason code.
    pub fn clean_batch<'a, I>(&self, raws: I) -> CleanReport
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut report = CleanReport::default();
        for raw in raws {
            match self.clean_game(raw) {
                Ok(game) => report.games.push(game),
                Err(reason) => {
                    debug!(
                        gameid = %text_or(raw.get("gameid"), ""),
                        reason = reason.as_str(),
                        "skipping raw game"
                    );
                    *report.rejected.entry(reason.as_str()).or_default() += 1;
                }
            }
        }
        report
    }

    fn build_player(&self, raw: &Value) -> PlayerRecord {
        let empty = Map::new();
        let decklist = raw
            .get("decklist")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let commander = decklist
            .get("_commander")
            .and_then(Value::as_str)
            .unwrap_or_default();

        PlayerRecord {
            name: text_or(raw.get("name"), "Unknown"),
            winner: bool_or_false(raw.get("winner")),
            commander: self.normalizer.commander(commander),
            deck_name: text_or(decklist.get("_name"), ""),
            turns: int_or(raw.get("turnsTaken"), DEFAULT_TURNS),
            actions: int_or(raw.get("actionsTaken"), DEFAULT_ACTIONS),
            cards_in_deck: self.card_entries(decklist.get("_cards")),
            cards_drawn: self.card_entries(raw.get("cardsDrawn")),
            cards_played: self.card_entries(raw.get("cardsPlayed")),
        }
    }

    fn card_entries(&self, raw: Option<&Value>) -> Vec<CardEntry> {
        let Some(items) = raw.and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| {
                let name = item.get("CardName").and_then(Value::as_str).unwrap_or_default();
                let name = self.normalizer.card(name);
                if name.is_empty() {
                    return None;
                }
                Some(CardEntry {
                    name,
                    count: count_or_default(item.get("Count")),
                })
            })
            .collect()
    }
}

/// Rounds on the decimal rendering rather than `value * 10.0`, whose
/// product can land on an exact .5 and round up (597 s is 9.95 min, which
/// is stored slightly below 9.95 and must give 9.9).
fn round_tenths(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}
