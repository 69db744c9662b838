use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::model::CanonicalGame;

pub const CACHE_FILE: &str = "games_cache.json";

#[derive(Debug, Default)]
pub struct CacheContents {
    pub games: Vec<CanonicalGame>,
    pub ids: HashSet<String>,
}

/// Durable store of canonical games, one JSON list on disk.
#[derive(Debug, Clone)]
pub struct GameCache {
    path: PathBuf,
}

impl GameCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or unreadable cache reads as empty.
    pub fn load(&self) -> CacheContents {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return CacheContents::default();
        };
        let games = match serde_json::from_str::<Vec<CanonicalGame>>(&raw) {
            Ok(games) => games,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cache unreadable, starting empty");
                return CacheContents::default();
            }
        };
        let ids = games.iter().map(|g| g.game_id.clone()).collect();
        CacheContents { games, ids }
    }

    /// Overwrites the cache with `games`.
    pub fn save(&self, games: &[CanonicalGame]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create cache dir {}", parent.display()))?;
        }
        let json = serde_json::to_string(games).context("serialize game cache")?;
        write_atomic(&self.path, &json).context("write game cache")
    }
}

/// Writes through a sibling temp file and renames it into place.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

/// Appends fresh games after the cached ones, dropping any whose id is
/// already present. The first occurrence of an id wins.
pub fn merge_games(cached: Vec<CanonicalGame>, fresh: Vec<CanonicalGame>) -> Vec<CanonicalGame> {
    let mut seen = HashSet::new();
    cached
        .into_iter()
        .chain(fresh)
        .filter(|g| seen.insert(g.game_id.clone()))
        .collect()
}
