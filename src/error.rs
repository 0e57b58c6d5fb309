//! Error types for anomaly scoring.

use thiserror::Error;

/// Anomaly error types.
#[derive(Error, Debug)]
pub enum AnomalyError {
    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A document node has a shape the vectorizer cannot embed
    #[error("Malformed document at '{path}': unsupported {found} node")]
    MalformedDocument { path: String, found: &'static str },

    /// Calibration statistics cannot produce a z-score
    #[error("Degenerate statistics: {count} samples, stddev {stddev}")]
    DegenerateStatistics { count: usize, stddev: f64 },

    /// Invalid vector dimensions
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Construction-time invariant violation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for anomaly operations.
pub type Result<T> = std::result::Result<T, AnomalyError>;
