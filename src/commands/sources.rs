//! Sources command implementation.

use anyhow::Result;
use std::path::Path;

use crate::cache::{CacheState, SourceCache};
use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::fs_abstraction::real_fs;
use crate::utils::{format_age, truncate};

/// Run the sources command
pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let fetcher = Fetcher::new()?;
    let cache = SourceCache::from_config(&config, real_fs(), &fetcher);

    println!();
    println!(
        " Cache: {} (expires after {})",
        cache.dir().display(),
        format_age(config.cache_expiry())
    );
    println!();
    println!(" #  SOURCE              FORMAT          CACHE");
    println!(" ── ────────────────── ─────────────── ────────────────");

    for (i, source) in config.blacklists.iter().enumerate() {
        let format = match &source.format_key {
            Some(key) => format!("{} ({})", source.format, key),
            None => source.format.clone(),
        };
        println!(
            " {:<2} {:<18} {:<15} {}",
            i + 1,
            truncate(&source.id, 18),
            truncate(&format, 15),
            describe(cache.state(&source.id))
        );
        println!("    {}", source.url);
    }

    if let Some(local) = &config.localblacklist {
        println!();
        println!(" Local blacklist: {} hosts", local.len());
    }
    println!();

    Ok(())
}

fn describe(state: CacheState) -> String {
    match state {
        CacheState::Fresh { age } => format!("fresh ({} old)", format_age(age)),
        CacheState::Stale { age } => format!("stale ({} old)", format_age(age)),
        CacheState::Missing => "missing".to_string(),
    }
}
