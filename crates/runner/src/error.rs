//! Error types for the runner crate

use scalper_ports::PersistenceError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reading the application config
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failures while bringing the engine up
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("State store unavailable: {0}")]
    Store(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
