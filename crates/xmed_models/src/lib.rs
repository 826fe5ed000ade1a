//! # xmed_models
//!
//! Classifier architectures for ExplainMed-rs.
//!
//! This crate provides:
//! - [`HistoResNet`]: the ResNet-50 tissue classifier with a replaced
//!   classification head
//! - Checkpoint save/load via Burn's record system with a JSON metadata
//!   sidecar

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod checkpoint;
mod resnet;

pub use checkpoint::{
    load_classifier, save_classifier, CheckpointError, ClassifierMetadata, WEIGHTS_FILE,
};
pub use resnet::{HistoResNet, HistoResNetConfig};
