//! Per-source statistics of one run.

use tracing::info;

use crate::render::HostOutcome;
use crate::utils::{format_count, truncate};

/// Counters for one source block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub name: String,
    pub candidates: usize,
    pub recorded: usize,
    pub too_long: usize,
    pub duplicates: usize,
    pub excluded: usize,
}

impl SourceStats {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn count(&mut self, outcome: HostOutcome) {
        self.candidates += 1;
        match outcome {
            HostOutcome::Recorded => self.recorded += 1,
            HostOutcome::RecordedTooLong => {
                self.recorded += 1;
                self.too_long += 1;
            }
            HostOutcome::SeenBefore => self.duplicates += 1,
            HostOutcome::Excluded => self.excluded += 1,
        }
    }
}

/// Statistics for all source blocks of a run, in processing order
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub sources: Vec<SourceStats>,
}

impl RunStats {
    pub fn push(&mut self, stats: SourceStats) {
        self.sources.push(stats);
    }

    pub fn total_recorded(&self) -> usize {
        self.sources.iter().map(|s| s.recorded).sum()
    }

    pub fn total_candidates(&self) -> usize {
        self.sources.iter().map(|s| s.candidates).sum()
    }

    /// Log a per-source table and totals
    pub fn log_summary(&self) {
        info!(" SOURCE              HOSTS    RECORDS   DUPS  EXCL  LONG");
        for s in &self.sources {
            info!(
                " {:<18} {:>6} {:>10} {:>6} {:>5} {:>5}",
                truncate(&s.name, 18),
                format_count(s.candidates),
                format_count(s.recorded),
                format_count(s.duplicates),
                format_count(s.excluded),
                s.too_long,
            );
        }
        info!(
            "{} hosts considered, {} records written",
            format_count(self.total_candidates()),
            format_count(self.total_recorded())
        );
    }
}
