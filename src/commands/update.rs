//! Update command implementation.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::info;

use crate::cmd_abstraction::RealCommandExecutor;
use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::fs_abstraction::real_fs;
use crate::lock::{lock_path, LockGuard};
use crate::pipeline::{self, Collaborators, RunOptions};
use crate::utils::format_count;

/// Run the update command
pub async fn run(dry_run: bool, no_reload: bool, config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Only one run may touch the cache and output at a time
    let _lock = LockGuard::acquire(&lock_path(&config))?;

    info!(
        "Updating {} from {} blacklists...",
        config.output.path().display(),
        config.blacklists.len()
    );

    let fetcher = Fetcher::new()?;
    let executor = RealCommandExecutor::new();
    let deps = Collaborators {
        fs: real_fs(),
        retriever: &fetcher,
        executor: &executor,
    };
    let options = RunOptions {
        dry_run,
        reload: !no_reload,
    };

    let report = pipeline::run(&config, deps, options, Utc::now()).await?;
    report.stats.log_summary();

    if dry_run {
        print!("{}", report.text);
        return Ok(());
    }

    println!(
        "[OK] {} records written to {}{}",
        format_count(report.stats.total_recorded()),
        config.output.path().display(),
        if report.reloaded { " (reload triggered)" } else { "" }
    );

    Ok(())
}
