use anyhow::{Result, anyhow};

use atlas_stats::cache::GameCache;
use atlas_stats::config::PipelineConfig;
use atlas_stats::logging;
use atlas_stats::report;

fn main() -> Result<()> {
    logging::load_env();
    logging::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = PipelineConfig::from_env();
    config.apply_args(&args);

    let cache = GameCache::new(&config.cache_path);
    let games = cache.load().games;
    if games.is_empty() {
        return Err(anyhow!(
            "no cached games at {}, run atlas_stats with a source first",
            cache.path().display()
        ));
    }

    let written =
        report::build_and_write_all(&games, &config.periods, &config.map_name, &config.data_dir)?;
    println!("Rebuilt reports from {} cached games", games.len());
    println!("Map: {}", config.map_name);
    for path in &written {
        println!(" - {}", path.display());
    }
    Ok(())
}
