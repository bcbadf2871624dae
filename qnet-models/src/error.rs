//! Error types for model configuration and runs

use std::path::PathBuf;

use qnet_core::SimError;
use qnet_metrics::MetricsError;
use thiserror::Error;

/// Errors found while reading or validating a model's input record.
///
/// All of these are reported before the run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing value for field '{field}'")]
    MissingToken { field: &'static str },

    #[error("Invalid value for field '{field}': {token:?}")]
    InvalidToken { field: &'static str, token: String },

    #[error("Field '{field}' must be {constraint}")]
    ConstraintViolation {
        field: &'static str,
        constraint: String,
    },

    #[error("Unexpected trailing input: {0:?}")]
    TrailingInput(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end a model run.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Report error: {0}")]
    Report(#[from] MetricsError),
}
