//! Error types for taxmemo
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in taxmemo
#[derive(Debug, Error)]
pub enum TaxMemoError {
    /// Unknown citation kind passed to the single-citation validator
    #[error("Unknown citation kind: {0}")]
    InvalidCitationKind(String),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Guidance site request error
    #[error("Scrape error: {0}")]
    Scrape(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for taxmemo operations
pub type Result<T> = std::result::Result<T, TaxMemoError>;
