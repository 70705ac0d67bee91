//! Error types for blackhole.
//!
//! Every variant is fatal for the run. Routine outcomes such as duplicates,
//! exclusions or over-long records are not errors and never appear here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlackholeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: blacklist '{source_id}' has unknown format '{format}' (expected 'hosts' or 'raw')")]
    UnknownFormat { source_id: String, format: String },

    #[error("Fetch error: HTTP {status} for {url}")]
    Fetch { status: u16, url: String },

    #[error("Fetch error: {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Blacklist '{source_id}' yielded no hosts (upstream format change?)")]
    EmptySource { source_id: String },

    #[error("File system error: {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BlackholeError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BlackholeError>;
