//! # xmed_core
//!
//! Core types for ExplainMed-rs histopathology diagnostics.
//!
//! This crate provides:
//! - [`Seed`] for deterministic random number generation
//! - [`DeviceConfig`] for explicit compute-device selection
//! - [`ClassLabels`] mapping class indices to diagnostic names
//! - [`Prediction`] holding a validated classifier output
//! - [`TissueClassifier`] trait implemented by classification models
//! - Error types and tensor utilities
//!
//! ## Shape Convention
//!
//! Image data follows the convention `(B, C, H, W)`:
//! - `B`: Batch size (number of images)
//! - `C`: Color channels (3 for RGB)
//! - `H`, `W`: Spatial height and width

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod device;
mod error;
mod labels;
mod model_trait;
mod prediction;
mod seed;
mod tensor;

pub use device::DeviceConfig;
pub use error::{CoreError, Result};
pub use labels::ClassLabels;
pub use model_trait::TissueClassifier;
pub use prediction::Prediction;
pub use seed::Seed;
pub use tensor::tensor_to_vec;

/// Backend type aliases for convenience.
pub mod backend {
    pub use burn_ndarray::NdArray;
}
