//! # xmed_report
//!
//! Diagnostic report rendering for ExplainMed-rs.
//!
//! A report is a single self-contained HTML document with a fixed
//! layout: title, diagnosis line, the full narrative, and a 2x2 grid of
//! the original image plus the three explanation visualizations, all
//! embedded as PNG data URIs. Rendering either produces the complete
//! document or fails — a partial document is never written.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod encoding;
mod error;
mod html;

pub use error::{ReportError, Result};
pub use html::{DiagnosticReport, ReportConfig};
