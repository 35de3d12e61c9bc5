//! Error types for Solvetrace

use thiserror::Error;

/// Errors that can occur at the parsing and encoding boundary.
///
/// The aggregator itself is total and never produces one of these.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Failed to parse activity session: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
