//! Explanation artifact type and summary helpers.

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Which generator produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplanationMethod {
    /// Gradient-weighted class activation overlay.
    GradCam,
    /// Local surrogate segment mask.
    SurrogateMask,
    /// Occlusion sensitivity grid.
    OcclusionMap,
}

impl ExplanationMethod {
    /// Display name for reports and logs.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            ExplanationMethod::GradCam => "Grad-CAM",
            ExplanationMethod::SurrogateMask => "Local Surrogate",
            ExplanationMethod::OcclusionMap => "Occlusion Sensitivity",
        }
    }
}

/// One explanation of one prediction: a rendered visualization plus a
/// short textual summary feeding the narrative generator.
///
/// The artifact records the class index it explains; the session
/// guarantees it equals the displayed prediction's index by passing the
/// same `Prediction` to every generator.
#[derive(Debug, Clone)]
pub struct ExplanationArtifact {
    /// The generator that produced this artifact.
    pub method: ExplanationMethod,
    /// The class index the explanation is for.
    pub class_index: usize,
    /// The rendered visualization.
    pub image: RgbImage,
    /// One-sentence summary of what the visualization shows.
    pub summary: String,
}

impl ExplanationArtifact {
    /// Spatial dimensions of the rendered visualization.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Name the 3x3 sector with the highest mean value in a row-major map.
///
/// Used to turn numeric maps into clinician-readable phrases like
/// "upper left" or "central".
#[must_use]
pub fn sector_phrase(values: &[f32], width: usize, height: usize) -> &'static str {
    const NAMES: [[&str; 3]; 3] = [
        ["upper left", "upper central", "upper right"],
        ["mid left", "central", "mid right"],
        ["lower left", "lower central", "lower right"],
    ];

    if values.is_empty() || width == 0 || height == 0 {
        return "central";
    }

    let mut sums = [[0.0f32; 3]; 3];
    let mut counts = [[0usize; 3]; 3];

    for y in 0..height {
        let sy = (y * 3 / height).min(2);
        for x in 0..width {
            let sx = (x * 3 / width).min(2);
            sums[sy][sx] += values[y * width + x];
            counts[sy][sx] += 1;
        }
    }

    let mut best = (0, 0);
    let mut best_mean = f32::NEG_INFINITY;
    for sy in 0..3 {
        for sx in 0..3 {
            if counts[sy][sx] > 0 {
                let mean = sums[sy][sx] / counts[sy][sx] as f32;
                if mean > best_mean {
                    best_mean = mean;
                    best = (sy, sx);
                }
            }
        }
    }

    NAMES[best.0][best.1]
}
