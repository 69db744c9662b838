use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardEntry {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub winner: bool,
    pub commander: String,
    pub deck_name: String,
    pub turns: i64,
    pub actions: i64,
    #[serde(default)]
    pub cards_in_deck: Vec<CardEntry>,
    #[serde(default)]
    pub cards_drawn: Vec<CardEntry>,
    #[serde(default)]
    pub cards_played: Vec<CardEntry>,
}

/// A validated game. Built once by the cleaner and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalGame {
    pub game_id: String,
    #[serde(default, with = "iso_timestamp")]
    pub datetime: Option<NaiveDateTime>,
    #[serde(default, with = "iso_timestamp")]
    pub datetime_started: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub map: String,
    #[serde(default)]
    pub format: String,
    pub first_player: String,
    pub players: Vec<PlayerRecord>,
}

impl CanonicalGame {
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// Cached timestamps are ISO-8601 strings. Offset-bearing values are folded
/// into UTC; values that do not parse are read back as absent.
pub mod iso_timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let trimmed = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.naive_utc());
        }
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}
