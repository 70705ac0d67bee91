//! blackhole - DNS blackhole list aggregator
//!
//! Merges upstream domain blacklists into a BIND response policy zone or a
//! hosts file and reloads the DNS server.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use blackhole::cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // Logs go to stderr so `update --dry-run` output can be redirected
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Update { dry_run, no_reload } => {
            blackhole::commands::update::run(dry_run, no_reload, &cli.config).await
        }
        Commands::Sources => blackhole::commands::sources::run(&cli.config).await,
        Commands::Config => blackhole::commands::config::run(),
        Commands::Version => {
            println!("blackhole {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
