//! Error types for reports and exporters

use thiserror::Error;

/// Errors related to building or writing run reports
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Metric not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
