//! Error types for xmed_report.

use thiserror::Error;

/// Result type alias using [`ReportError`].
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while rendering or writing a report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// An embedded image could not be encoded.
    #[error("Failed to encode report image '{name}': {reason}")]
    ImageEncode {
        /// Which image slot failed.
        name: String,
        /// Encoder error description.
        reason: String,
    },

    /// An input to the report was empty or inconsistent.
    #[error("Invalid report input: {0}")]
    InvalidInput(String),

    /// Writing the document failed.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
