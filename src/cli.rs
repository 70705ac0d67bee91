//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blackhole")]
#[command(author, version, about = "DNS blackhole list aggregator (RPZ zones, hosts files)")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "/etc/blackhole/config.yaml", global = true)]
    pub config: PathBuf,

    /// Quiet mode (for cron/systemd timer)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch blacklists, rebuild the output file and reload the DNS server
    Update {
        /// Print the rendered output instead of writing it
        #[arg(long)]
        dry_run: bool,

        /// Write the output but do not run the reload command
        #[arg(long)]
        no_reload: bool,
    },

    /// List configured blacklist sources and their cache state
    Sources,

    /// Print a commented default configuration
    Config,

    /// Show version
    Version,
}
