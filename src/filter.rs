use std::borrow::Cow;

use chrono::{DateTime, Duration, Utc};

use crate::model::CanonicalGame;

pub const ALL_MAPS: &str = "all";

/// Keeps games played within the last `days` days.
///
/// With no window the input slice itself is handed back (`Cow::Borrowed`),
/// so callers can compare pointers instead of copying. Games without a
/// timestamp never pass a window.
pub fn filter_by_period<'s, 'g>(
    games: &'s [&'g CanonicalGame],
    days: Option<u32>,
) -> Cow<'s, [&'g CanonicalGame]> {
    filter_by_period_at(games, days, Utc::now())
}

pub fn filter_by_period_at<'s, 'g>(
    games: &'s [&'g CanonicalGame],
    days: Option<u32>,
    now: DateTime<Utc>,
) -> Cow<'s, [&'g CanonicalGame]> {
    let Some(days) = days else {
        return Cow::Borrowed(games);
    };
    // A window reaching past the representable range admits every dated game.
    let cutoff = Duration::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d));
    Cow::Owned(
        games
            .iter()
            .copied()
            .filter(|g| {
                g.datetime
                    .is_some_and(|dt| cutoff.is_none_or(|cutoff| dt.and_utc() >= cutoff))
            })
            .collect(),
    )
}

/// `"all"` keeps everything; any other name must match the map exactly.
pub fn filter_by_map<'s, 'g>(
    games: &'s [&'g CanonicalGame],
    map_name: &str,
) -> Cow<'s, [&'g CanonicalGame]> {
    if map_name == ALL_MAPS {
        return Cow::Borrowed(games);
    }
    Cow::Owned(
        games
            .iter()
            .copied()
            .filter(|g| g.map == map_name)
            .collect(),
    )
}
