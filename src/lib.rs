//! # blackhole - DNS blackhole list aggregator
//!
//! Fetches third-party domain blacklists, merges them with deduplication and
//! exclusions, and renders a DNS server specific artifact: a BIND response
//! policy zone or a hosts(5) file. The artifact replaces the previous one
//! atomically and the DNS server is asked to reload.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        blackhole                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: update, sources, config, version           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SourceCache ── Fetcher (reqwest + rustls)                  │
//! │    └── <cachedir>/<cacheprefix><id>, freshness window       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Parser (hosts | raw) ──> Ledger (normalize, exclude, dedup)│
//! ├─────────────────────────────────────────────────────────────┤
//! │  Document (rpz zone | hosts file)                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Writer (.TMP -> rename, .old backup) ──> reload command    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use blackhole::cmd_abstraction::RealCommandExecutor;
//! use blackhole::config::Config;
//! use blackhole::fetcher::Fetcher;
//! use blackhole::fs_abstraction::real_fs;
//! use blackhole::pipeline::{run, Collaborators, RunOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("/etc/blackhole/config.yaml")?;
//!     let fetcher = Fetcher::new()?;
//!     let executor = RealCommandExecutor::new();
//!     let deps = Collaborators {
//!         fs: real_fs(),
//!         retriever: &fetcher,
//!         executor: &executor,
//!     };
//!     let report = run(&config, deps, RunOptions::default(), chrono::Utc::now()).await?;
//!     println!("{} records", report.stats.total_recorded());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`cache`] - On-disk cache of upstream lists
//! - [`cli`] - Command-line interface definitions
//! - [`cmd_abstraction`] - Command execution seam (reload)
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Fatal error taxonomy
//! - [`fetcher`] - HTTP retrieval of upstream lists
//! - [`fs_abstraction`] - Filesystem seam (cache, writer)
//! - [`ledger`] - Host normalization, exclusions, deduplication
//! - [`lock`] - File locking against concurrent runs
//! - [`parser`] - `hosts` and `raw` list parsers
//! - [`pipeline`] - One complete run
//! - [`reload`] - DNS server reload trigger
//! - [`render`] - Output document builder
//! - [`stats`] - Per-source run statistics
//! - [`utils`] - Formatting helpers
//! - [`writer`] - Atomic artifact replacement

pub mod cache;
pub mod cli;
pub mod cmd_abstraction;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod fs_abstraction;
pub mod ledger;
pub mod lock;
pub mod parser;
pub mod pipeline;
pub mod reload;
pub mod render;
pub mod stats;
pub mod utils;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::BlackholeError;
