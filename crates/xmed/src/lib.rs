//! # xmed
//!
//! ExplainMed-rs: explainable histopathology diagnostics in Rust.
//!
//! The pipeline classifies a tissue section image with a ResNet-50
//! classifier, explains the prediction three independent ways
//! (Grad-CAM, local surrogate, occlusion sensitivity), narrates the
//! result in clinician-readable text, and exports a report document.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xmed::prelude::*;
//! use xmed::session::{DiagnosticSession, SessionConfig};
//!
//! let labels = ClassLabels::default();
//! let device = DeviceConfig::Cpu.ndarray_device();
//! let (model, _meta) = load_classifier("./checkpoint", &labels, &device)?;
//!
//! let session = DiagnosticSession::new(model, labels, SessionConfig::default())?;
//! let image = load_image("section.png")?;
//! let diagnosis = session.diagnose(&image, &OllamaClient::default())?;
//! session.write_report(&diagnosis, "report.html")?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod session;

// Re-export all crates
pub use xmed_core as core;
pub use xmed_explain as explain;
pub use xmed_imaging as imaging;
pub use xmed_models as models;
pub use xmed_narrate as narrate;
pub use xmed_report as report;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use xmed::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use xmed_core::{ClassLabels, DeviceConfig, Prediction, Seed, TissueClassifier};

    // Imaging
    pub use xmed_imaging::{decode_image, load_image, Heatmap, ImageTransform, SlicConfig};

    // Models
    pub use xmed_models::{load_classifier, save_classifier, HistoResNet, HistoResNetConfig};

    // Explain
    pub use xmed_explain::{
        ExplanationArtifact, ExplanationMethod, OcclusionConfig, SurrogateConfig,
    };

    // Narrate
    pub use xmed_narrate::{
        fallback_narrative, ExplanationSummaries, NarrativeGenerator, OllamaClient,
    };

    // Report
    pub use xmed_report::{DiagnosticReport, ReportConfig};

    // Session
    pub use crate::session::{
        DefaultBackend, DiagnosticSession, Diagnosis, NarrativeSource, SessionConfig,
    };
}
