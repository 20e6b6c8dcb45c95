//! Error types for corpus-forge operations.
//!
//! Defines error types for the major subsystems:
//! - Dataset file storage and row parsing
//! - LLM API interactions

use thiserror::Error;

/// Errors that can occur during dataset file operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Malformed row at line {line} in '{path}': expected {expected} fields, found {found}")]
    MalformedRow {
        path: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: OPENROUTER_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
