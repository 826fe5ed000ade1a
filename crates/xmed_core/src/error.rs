//! Error types for xmed_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur in xmed_core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Probability vector violates the softmax invariant.
    #[error("Invalid probability vector: {0}")]
    InvalidProbabilities(String),

    /// Class index outside the label mapping.
    #[error("Class index {index} out of range for {n_classes} classes")]
    ClassOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of classes in the mapping.
        n_classes: usize,
    },

    /// Invalid label mapping.
    #[error("Invalid label mapping: {0}")]
    InvalidLabels(String),

    /// Tensor data could not be read back to host memory.
    #[error("Tensor read error: {0}")]
    TensorRead(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}
