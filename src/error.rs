use thiserror::Error;

/// Main error type for recmetrics
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Score and relevance matrices disagree on (queries, items)
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Invalid input (zero k, ragged rows, empty item axis)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON fixture / report errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenient Result type using MetricsError
pub type Result<T> = std::result::Result<T, MetricsError>;
