//! Error types for xmed_explain.

use thiserror::Error;

/// Result type alias using [`ExplainError`].
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Errors that can occur while generating explanations.
///
/// Explanation failures are hard errors: a corrupted or silently
/// defaulted artifact misleads a clinician, which is worse than no
/// artifact at all.
#[derive(Error, Debug)]
pub enum ExplainError {
    /// The backward pass produced no gradient for the feature layer.
    #[error("No gradient available for the designated feature layer")]
    GradientUnavailable,

    /// The prediction's class index does not fit the classifier output.
    #[error("Class index {index} out of range for {n_classes} model outputs")]
    ClassOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of classifier outputs.
        n_classes: usize,
    },

    /// The prediction function returned an unexpected shape.
    #[error("Prediction function returned unexpected shape: {0}")]
    PredictionShape(String),

    /// The prediction function itself failed.
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// The local surrogate model could not be fit.
    #[error("Surrogate fit failed: {0}")]
    SurrogateFit(String),

    /// Invalid explainer configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Imaging error (segmentation, heatmap composition).
    #[error(transparent)]
    Imaging(#[from] xmed_imaging::ImagingError),

    /// Core error (tensor readback, invariants).
    #[error(transparent)]
    Core(#[from] xmed_core::CoreError),
}
