//! # xmed_explain
//!
//! Explanation generators for ExplainMed-rs.
//!
//! Three independent, stateless generators operate on a trained
//! classifier and one input image:
//!
//! - [`grad_cam`]: gradient-weighted class activation overlay
//! - [`surrogate_mask`]: perturbation-based local surrogate highlighting
//!   the superpixels supporting the prediction
//! - [`occlusion_scan`]: tile-occlusion sensitivity grid
//!
//! All three take the same immutable [`Prediction`](xmed_core::Prediction),
//! so an artifact can never be computed for a class other than the one
//! being displayed.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod artifact;
mod error;
mod gradcam;
mod occlusion;
mod surrogate;

pub use artifact::{sector_phrase, ExplanationArtifact, ExplanationMethod};
pub use error::{ExplainError, Result};
pub use gradcam::grad_cam;
pub use occlusion::{occlusion_scan, OcclusionConfig, OcclusionMap};
pub use surrogate::{surrogate_mask, SurrogateConfig};
