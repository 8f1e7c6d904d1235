//! Error types for Replog

use thiserror::Error;

/// Engine error type
///
/// Detection itself never fails; these only surface from configuration
/// loading and dismissal-store access.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dismissal storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
