//! # xmed_narrate
//!
//! Narrative generation for ExplainMed-rs.
//!
//! This crate provides:
//! - [`NarrativeGenerator`] trait and the [`OllamaClient`] implementation
//!   calling a local text-generation service with an explicit timeout
//! - [`fallback_narrative`]: the deterministic template used when the
//!   service is unreachable or returns garbage
//!
//! The client returns a `Result`; the fallback decision belongs to the
//! caller. A narrative failure is never a user-visible error.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod error;
mod fallback;
mod prompt;

pub use client::{NarrativeGenerator, OllamaClient};
pub use error::{NarrateError, Result};
pub use fallback::fallback_narrative;
pub use prompt::{build_prompt, ExplanationSummaries};
