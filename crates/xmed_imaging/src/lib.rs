//! # xmed_imaging
//!
//! Image handling for ExplainMed-rs.
//!
//! This crate provides:
//! - Decoding and validation of uploaded JPEG/PNG images
//! - The resize + per-channel normalization transform feeding the classifier
//! - Heatmap normalization, bilinear resizing, jet colorization and overlay
//! - SLIC superpixel segmentation and segment boundary drawing

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod heatmap;
mod loader;
mod segmentation;
mod transform;

pub use error::{ImagingError, Result};
pub use heatmap::{jet_color, Heatmap};
pub use loader::{decode_image, load_image};
pub use segmentation::{
    draw_boundaries, draw_selected_boundaries, slic, SegmentMap, SlicConfig, BOUNDARY_COLOR,
};
pub use transform::ImageTransform;
