//! CLI command implementations.

pub mod config;
pub mod sources;
pub mod update;
