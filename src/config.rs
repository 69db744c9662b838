use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cache::CACHE_FILE;
use crate::clean::{Cleaner, DEFAULT_MIN_TURNS};
use crate::filter::ALL_MAPS;
use crate::normalize::Normalizer;

const APP_DIR: &str = "atlas_stats";
const DEFAULT_DATA_DIR: &str = "site/data";
const DEFAULT_PERIODS: &[u32] = &[30, 7];

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub cache_path: PathBuf,
    pub data_dir: PathBuf,
    pub source_path: Option<PathBuf>,
    pub min_turns: i64,
    pub renames_path: Option<PathBuf>,
    pub periods: Vec<u32>,
    pub map_name: String,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cache_path = get("ATLAS_CACHE_PATH")
            .map(PathBuf::from)
            .or_else(|| app_cache_dir(&get).map(|dir| dir.join(CACHE_FILE)))
            .unwrap_or_else(|| PathBuf::from("data").join(CACHE_FILE));
        let min_turns = get("ATLAS_MIN_TURNS")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_MIN_TURNS);
        let periods = match lookup("ATLAS_PERIODS") {
            Some(raw) => parse_periods(&raw),
            None => DEFAULT_PERIODS.to_vec(),
        };

        Self {
            cache_path,
            data_dir: get("ATLAS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            source_path: get("ATLAS_SOURCE_PATH").map(PathBuf::from),
            min_turns,
            renames_path: get("ATLAS_RENAMES_PATH").map(PathBuf::from),
            periods,
            map_name: ALL_MAPS.to_string(),
        }
    }

    /// Applies `--source`, `--cache`, `--out` and `--map` overrides.
    pub fn apply_args(&mut self, args: &[String]) {
        if let Some(path) = arg_value(args, "--source") {
            self.source_path = Some(PathBuf::from(path));
        }
        if let Some(path) = arg_value(args, "--cache") {
            self.cache_path = PathBuf::from(path);
        }
        if let Some(path) = arg_value(args, "--out") {
            self.data_dir = PathBuf::from(path);
        }
        if let Some(map) = arg_value(args, "--map") {
            self.map_name = map;
        }
    }

    pub fn load_normalizer(&self) -> Result<Normalizer> {
        match self.renames_path.as_deref() {
            Some(path) => load_renames(path),
            None => Ok(Normalizer::default()),
        }
    }

    pub fn cleaner(&self) -> Result<Cleaner> {
        Ok(Cleaner::new(self.load_normalizer()?, self.min_turns))
    }
}

/// A missing rename file means no renames; a malformed one is an error.
pub fn load_renames(path: &Path) -> Result<Normalizer> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Normalizer::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read rename tables {}", path.display()));
        }
    };
    serde_json::from_str(&raw).with_context(|| format!("parse rename tables {}", path.display()))
}

pub fn parse_periods(raw: &str) -> Vec<u32> {
    let mut out = Vec::new();
    for days in raw
        .split([',', ';', ' '])
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .filter(|d| *d != 0)
    {
        if !out.contains(&days) {
            out.push(days);
        }
    }
    out
}

pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.clone());
        }
    }
    None
}

fn app_cache_dir(get: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(base) = get("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = get("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}
