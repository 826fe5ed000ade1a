//! Error types for xmed_narrate.

use thiserror::Error;

/// Result type alias using [`NarrateError`].
pub type Result<T> = std::result::Result<T, NarrateError>;

/// Errors from the external text-generation service.
///
/// These never reach the end user: the caller substitutes the
/// deterministic fallback narrative and records the reason.
#[derive(Error, Debug)]
pub enum NarrateError {
    /// Transport-level failure (connection refused, timeout, HTTP error).
    #[error("Text-generation request failed: {0}")]
    Request(String),

    /// The service answered but the body was not the expected shape.
    #[error("Malformed text-generation response: {0}")]
    MalformedResponse(String),

    /// The service answered with empty text.
    #[error("Text-generation service returned empty text")]
    EmptyResponse,
}
