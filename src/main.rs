use anyhow::{Context, Result};

use atlas_stats::cache::GameCache;
use atlas_stats::config::PipelineConfig;
use atlas_stats::ingest::{self, JsonExportSource};
use atlas_stats::logging;
use atlas_stats::report;

fn main() -> Result<()> {
    logging::load_env();
    logging::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = PipelineConfig::from_env();
    config.apply_args(&args);

    let cache = GameCache::new(&config.cache_path);
    let cleaner = config.cleaner()?;

    println!("Atlas Conquest stats pipeline");
    println!("Cache: {}", cache.path().display());

    match config.source_path.as_ref() {
        Some(source_path) => {
            let source = JsonExportSource::new(source_path);
            let summary = ingest::ingest(&source, &cache, &cleaner)
                .with_context(|| format!("ingest {}", source_path.display()))?;
            println!(
                "Fetched: {} (already cached: {})",
                summary.fetched, summary.already_cached
            );
            println!("Accepted: {}", summary.accepted);
            if !summary.rejected.is_empty() {
                println!("Rejected: {}", summary.rejected_total());
                for (reason, count) in &summary.rejected {
                    println!(" - {reason}: {count}");
                }
            }
            println!("Cached games: {}", summary.total_cached);
        }
        None => println!("No source configured, reporting from cache only"),
    }

    let games = cache.load().games;
    let written =
        report::build_and_write_all(&games, &config.periods, &config.map_name, &config.data_dir)?;
    println!(
        "Reports: {} files under {}",
        written.len(),
        config.data_dir.display()
    );
    Ok(())
}
