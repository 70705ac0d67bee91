//! One aggregation run: fetch, parse, merge, render, commit, reload.
//!
//! Sources are processed strictly in configuration order. That order decides
//! which source a duplicate host is attributed to and the layout of the
//! output, so nothing here runs concurrently. Any fatal error returns before
//! the writer is reached; the artifact is only committed after every source
//! has been rendered.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cache::SourceCache;
use crate::cmd_abstraction::CommandExecutor;
use crate::config::{Config, OutputConfig};
use crate::fetcher::Retriever;
use crate::fs_abstraction::FileSystem;
use crate::parser::{parse_source, Event};
use crate::reload;
use crate::render::{named_conf_snippet, Document};
use crate::stats::{RunStats, SourceStats};
use crate::utils::format_count;
use crate::writer;

/// Banner location shown for the local blacklist block
const LOCAL_BLACKLIST: &str = "localblacklist";

/// External collaborators of a run
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub fs: &'a dyn FileSystem,
    pub retriever: &'a dyn Retriever,
    pub executor: &'a dyn CommandExecutor,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Render only; write nothing and reload nothing
    pub dry_run: bool,
    /// Trigger the reload command after a commit
    pub reload: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            reload: true,
        }
    }
}

/// What a run produced
#[derive(Debug)]
pub struct RunReport {
    pub text: String,
    pub stats: RunStats,
    pub committed: bool,
    pub reloaded: bool,
}

/// Render the complete document for `config` without touching the output.
pub async fn build_document(
    config: &Config,
    cache: &SourceCache<'_>,
    now: DateTime<Utc>,
) -> Result<(Document, RunStats)> {
    let mut doc = Document::for_config(config, now);
    let mut run = RunStats::default();

    for source in &config.blacklists {
        doc.add_banner(&source.id, &source.url);

        let raw = cache
            .fetch(source)
            .await
            .with_context(|| format!("Failed to retrieve blacklist '{}'", source.id))?;
        let events = parse_source(source, &raw)?;

        let mut stats = SourceStats::new(&source.id);
        for event in events {
            match event {
                Event::Comment(text) => doc.add_comment(&text),
                Event::Host(host) => stats.count(doc.add_host(&host, &source.id)),
            }
        }
        info!(
            "{}: {} hosts, {} new",
            source.id,
            format_count(stats.candidates),
            format_count(stats.recorded)
        );
        run.push(stats);
    }

    if let Some(hosts) = &config.localblacklist {
        doc.add_banner(&config.origin, LOCAL_BLACKLIST);
        let mut stats = SourceStats::new(&config.origin);
        for host in hosts {
            stats.count(doc.add_host(host, &config.origin));
        }
        run.push(stats);
    }

    Ok((doc, run))
}

/// Run the whole pipeline for `config`
pub async fn run(
    config: &Config,
    deps: Collaborators<'_>,
    options: RunOptions,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    config.validate()?;

    let cache = SourceCache::from_config(config, deps.fs, deps.retriever);
    let (doc, stats) = build_document(config, &cache, now).await?;
    let text = doc.render();

    if options.dry_run {
        info!("Dry run: {} not written", config.output.path().display());
        return Ok(RunReport {
            text,
            stats,
            committed: false,
            reloaded: false,
        });
    }

    let path = config.output.path();
    writer::commit(deps.fs, path, &text)
        .with_context(|| format!("Failed to write {:?}", path))?;
    info!(
        "Wrote {} ({} records)",
        path.display(),
        format_count(doc.ledger().len())
    );

    ensure_named_conf(config, deps.fs)?;

    let reloaded = options.reload && reload::trigger(deps.executor, config.output.reload_command());

    Ok(RunReport {
        text,
        stats,
        committed: true,
        reloaded,
    })
}

/// Create the rpz named.conf snippet if configured and absent
fn ensure_named_conf(config: &Config, fs: &dyn FileSystem) -> Result<()> {
    let OutputConfig::Rpz(rpz) = &config.output else {
        return Ok(());
    };
    let Some(path) = &rpz.namedconf else {
        return Ok(());
    };
    if fs.exists(path) {
        debug!("{:?} exists, leaving it alone", path);
        return Ok(());
    }

    let snippet = named_conf_snippet(&rpz.zonename, &rpz.zonefile);
    fs.write(path, snippet.as_bytes())
        .with_context(|| format!("Failed to write {:?}", path))?;
    info!("Created {}", path.display());
    Ok(())
}
