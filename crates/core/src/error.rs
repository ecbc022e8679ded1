//! Error types for the QuantDesk signal engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the signal engine.
///
/// The engine favors degraded output over errors: most components return a
/// neutral default or retain their previous value when data is thin. Hard
/// failures are reserved for inputs that would corrupt derived state,
/// which in practice means history seeding.
#[derive(Error, Debug)]
pub enum Error {
    /// Seed history rejected: out-of-order times or invalid OHLC values.
    #[error("Invalid history: {0}")]
    InvalidHistory(String),

    /// Insufficient data for a computation that cannot degrade.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid history error.
    pub fn invalid_history(msg: impl Into<String>) -> Self {
        Error::InvalidHistory(msg.into())
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Error::InsufficientData(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
