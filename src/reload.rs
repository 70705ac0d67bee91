//! Telling the DNS server to pick up a new artifact.

use tracing::{debug, info, warn};

use crate::cmd_abstraction::CommandExecutor;

/// Start the configured reload command, fire-and-forget.
///
/// Returns whether a command was started. A failure to start is logged and
/// otherwise ignored: the artifact is already committed and the next run
/// reloads again.
pub fn trigger(executor: &dyn CommandExecutor, argv: &[String]) -> bool {
    let Some((cmd, args)) = argv.split_first() else {
        debug!("No reload command configured");
        return false;
    };

    match executor.spawn(cmd, args) {
        Ok(()) => {
            info!("Reload triggered: {}", argv.join(" "));
            true
        }
        Err(e) => {
            warn!("Reload command failed to start: {:#}", e);
            false
        }
    }
}
