//! Error types for the CSCV engine.

use thiserror::Error;

/// Main error type for CSCV analysis.
#[derive(Error, Debug)]
pub enum CscvError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(
        "Non-finite criterion value {value} for strategy {strategy} at combination {combination}"
    )]
    NonFiniteCriterion {
        combination: usize,
        strategy: usize,
        value: f64,
    },
}

/// Result type alias for CSCV operations.
pub type Result<T> = std::result::Result<T, CscvError>;
