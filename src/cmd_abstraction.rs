//! Command execution abstraction for testability.
//!
//! Reload commands are started through [`CommandExecutor`] so tests can
//! check what would have been run without running it.

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

#[cfg(test)]
use mockall::automock;

/// Trait for starting external commands, allowing dependency injection for
/// testing.
#[cfg_attr(test, automock)]
pub trait CommandExecutor: Send + Sync {
    /// Start `cmd` with `args` and return without waiting for it.
    ///
    /// Only a failure to start the process is reported; its exit status is
    /// never observed.
    fn spawn(&self, cmd: &str, args: &[String]) -> Result<()>;
}

/// Real implementation of CommandExecutor that starts system commands.
#[derive(Debug, Clone, Default)]
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    /// Create a new RealCommandExecutor
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn spawn(&self, cmd: &str, args: &[String]) -> Result<()> {
        Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", cmd))?;
        Ok(())
    }
}

/// Helper function to convert a slice of &str to Vec<String>.
///
/// mockall has issues with lifetimes in `&[&str]`, so the trait takes
/// `&[String]` instead.
pub fn args_to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
