//! Error types for xmed_imaging.

use thiserror::Error;

/// Result type alias using [`ImagingError`].
pub type Result<T> = std::result::Result<T, ImagingError>;

/// Errors that can occur in imaging operations.
///
/// Upload rejection distinguishes "not an image" from "wrong channel
/// count" so the user-facing message can say which it was.
#[derive(Error, Debug)]
pub enum ImagingError {
    /// The bytes are not a recognized image format.
    #[error("Not an image: {0}")]
    NotAnImage(String),

    /// The image decoded but its channel layout is unsupported.
    #[error("Unsupported channel count: {found} (expected RGB or RGBA)")]
    UnsupportedChannels {
        /// Description of the channel layout found.
        found: String,
    },

    /// The image format was recognized but decoding failed.
    #[error("Image decode error: {0}")]
    Decode(String),

    /// Image encoding failed.
    #[error("Image encode error: {0}")]
    Encode(String),

    /// Shape mismatch between a heatmap and its backing buffer or base image.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Invalid segmentation parameters.
    #[error("Segmentation error: {0}")]
    Segmentation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
