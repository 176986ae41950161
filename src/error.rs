//! Error types
//!
//! Byte processing never fails: malformed input is absorbed by fallbacks.
//! Errors only come from configuration and serialization.

use thiserror::Error;

/// Errors produced by the terminal core
#[derive(Debug, Error)]
pub enum Error {
    /// Columns or rows were zero
    #[error("invalid terminal dimensions {cols}x{rows}")]
    InvalidDimensions { cols: usize, rows: usize },

    /// An option was outside its accepted range
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    /// JSON (de)serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
