use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::info;

use crate::cache::{GameCache, merge_games};
use crate::clean::Cleaner;
use crate::coerce::text_or;

/// Supplies raw game items from the remote datastore or an export of it.
pub trait RecordSource {
    fn fetch(&self) -> Result<Vec<Value>>;
}

/// A datastore export on disk: either a bare JSON array of items or a scan
/// response with an `Items` array.
#[derive(Debug, Clone)]
pub struct JsonExportSource {
    path: PathBuf,
}

impl JsonExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonExportSource {
    fn fetch(&self) -> Result<Vec<Value>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read raw export {}", self.path.display()))?;
        parse_export_json(&raw)
    }
}

/// Static items, handy for feeding already-fetched records through ingest.
impl RecordSource for Vec<Value> {
    fn fetch(&self) -> Result<Vec<Value>> {
        Ok(self.clone())
    }
}

pub fn parse_export_json(raw: &str) -> Result<Vec<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid raw export json")?;
    match root {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("Items") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(anyhow!("raw export object has no Items array")),
        },
        _ => Err(anyhow!("raw export must be an array or an object with Items")),
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub fetched: usize,
    pub already_cached: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<&'static str, usize>,
    pub total_cached: usize,
}

impl IngestSummary {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Incremental ingest: items whose `gameid` is already cached are skipped,
/// the rest are cleaned, merged behind the cached games and saved.
pub fn ingest(
    source: &dyn RecordSource,
    cache: &GameCache,
    cleaner: &Cleaner,
) -> Result<IngestSummary> {
    let cached = cache.load();
    let cached_count = cached.games.len();
    let raws = source.fetch().context("fetch raw games")?;
    let fetched = raws.len();

    let unseen = raws
        .iter()
        .filter(|raw| !cached.ids.contains(&text_or(raw.get("gameid"), "")))
        .collect::<Vec<_>>();
    let already_cached = fetched - unseen.len();

    let report = cleaner.clean_batch(unseen);
    let merged = merge_games(cached.games, report.games);
    cache.save(&merged)?;
    // Ids repeated within one fetch collapse in the merge.
    let accepted = merged.len().saturating_sub(cached_count);

    let summary = IngestSummary {
        fetched,
        already_cached,
        accepted,
        rejected: report.rejected,
        total_cached: merged.len(),
    };
    info!(
        fetched = summary.fetched,
        already_cached = summary.already_cached,
        accepted = summary.accepted,
        rejected = summary.rejected_total(),
        total_cached = summary.total_cached,
        "ingest complete"
    );
    Ok(summary)
}
