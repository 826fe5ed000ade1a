//! Perturbation-based local surrogate explanation.

use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xmed_core::{Prediction, Seed};
use xmed_imaging::{draw_selected_boundaries, slic, SlicConfig, BOUNDARY_COLOR};

use crate::artifact::{sector_phrase, ExplanationArtifact, ExplanationMethod};
use crate::error::{ExplainError, Result};

/// Configuration for the local surrogate explainer.
///
/// This is the most compute-expensive explainer: cost is
/// `O(num_samples)` classifier forward passes. `num_samples` and
/// `batch_size` are the knobs to cap for interactive use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrogateConfig {
    /// Number of randomly perturbed variants to score.
    pub num_samples: usize,
    /// Number of top positively-weighted segments to highlight.
    pub top_segments: usize,
    /// Width of the exponential proximity kernel weighting samples.
    pub kernel_width: f32,
    /// Ridge regularization strength for the linear surrogate fit.
    pub ridge: f32,
    /// Perturbed variants scored per prediction call.
    pub batch_size: usize,
    /// Seed for the perturbation sampling. `None` draws from entropy,
    /// making runs non-reproducible; set a seed for identical masks
    /// across runs.
    pub seed: Option<Seed>,
    /// Superpixel segmentation parameters.
    pub slic: SlicConfig,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            num_samples: 1000,
            top_segments: 5,
            kernel_width: 0.25,
            ridge: 1.0,
            batch_size: 32,
            seed: None,
            slic: SlicConfig::default(),
        }
    }
}

impl SurrogateConfig {
    /// Cap the number of perturbed variants.
    #[must_use]
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// Set the perturbation seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Explain a prediction with a local linear surrogate over superpixels.
///
/// The image is partitioned into superpixel segments; `num_samples`
/// variants with random segments blacked out are scored through
/// `predict`; a locally-weighted ridge regression over the binary
/// segment masks ranks each segment's contribution to the target-class
/// probability. The output shows the original image with boundaries
/// drawn around the top-N positively-weighted segments.
///
/// # Arguments
///
/// * `predict` - Batch prediction function: images in, one probability
///   vector per image out.
/// * `image` - Source image (the resized classifier input).
/// * `prediction` - The prediction being explained.
/// * `config` - Sampling and fit parameters.
///
/// # Errors
///
/// Sampling or prediction failures are surfaced, never silently
/// defaulted — a malformed mask misleads a clinician.
pub fn surrogate_mask<F>(
    mut predict: F,
    image: &RgbImage,
    prediction: &Prediction,
    config: &SurrogateConfig,
) -> Result<ExplanationArtifact>
where
    F: FnMut(&[RgbImage]) -> Result<Vec<Vec<f32>>>,
{
    if config.num_samples == 0 {
        return Err(ExplainError::InvalidConfig(
            "num_samples must be positive".into(),
        ));
    }

    let segments = slic(image, &config.slic)?;
    let n_segments = segments.n_segments();
    let class_index = prediction.class_index();

    debug!(n_segments, num_samples = config.num_samples, "sampling perturbations");

    let mut rng = match config.seed {
        Some(seed) => seed.to_rng(),
        None => ChaCha8Rng::from_entropy(),
    };

    // Binary masks over segments; the first sample is the unperturbed image.
    let mut masks: Vec<Vec<bool>> = Vec::with_capacity(config.num_samples);
    masks.push(vec![true; n_segments]);
    for _ in 1..config.num_samples {
        masks.push((0..n_segments).map(|_| rng.gen_bool(0.5)).collect());
    }

    // Score every variant through the classifier in batches
    let mut targets = Vec::with_capacity(masks.len());
    for chunk in masks.chunks(config.batch_size.max(1)) {
        let variants: Vec<RgbImage> = chunk.iter().map(|m| apply_mask(image, &segments, m)).collect();
        let probs = predict(&variants)?;

        if probs.len() != variants.len() {
            return Err(ExplainError::PredictionShape(format!(
                "expected {} probability vectors, got {}",
                variants.len(),
                probs.len()
            )));
        }
        for row in &probs {
            let p = row.get(class_index).ok_or_else(|| {
                ExplainError::PredictionShape(format!(
                    "probability vector of length {} lacks class {}",
                    row.len(),
                    class_index
                ))
            })?;
            targets.push(*p);
        }
    }

    // Proximity kernel: samples closer to the unperturbed image count more
    let sample_weights: Vec<f64> = masks
        .iter()
        .map(|mask| {
            let frac_on = mask.iter().filter(|&&on| on).count() as f64 / n_segments as f64;
            let distance = 1.0 - frac_on.sqrt();
            (-(distance / config.kernel_width as f64).powi(2)).exp()
        })
        .collect();

    let segment_weights = fit_weighted_ridge(
        &masks,
        &targets,
        &sample_weights,
        config.ridge as f64,
    )?;

    // Rank segments by weight, keep the top positively-weighted ones
    let mut ranked: Vec<(u32, f64)> = segment_weights
        .iter()
        .enumerate()
        .map(|(i, w)| (i as u32, *w))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let selected: Vec<u32> = ranked
        .iter()
        .take(config.top_segments)
        .filter(|(_, w)| *w > 0.0)
        .map(|(label, _)| *label)
        .collect();

    let summary = build_summary(&selected, &segments, image);
    let rendered = draw_selected_boundaries(image, &segments, &selected, BOUNDARY_COLOR);

    Ok(ExplanationArtifact {
        method: ExplanationMethod::SurrogateMask,
        class_index,
        image: rendered,
        summary,
    })
}

/// Black out the segments switched off by a mask.
fn apply_mask(image: &RgbImage, segments: &xmed_imaging::SegmentMap, mask: &[bool]) -> RgbImage {
    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let label = segments.label_at(x, y) as usize;
        if !mask.get(label).copied().unwrap_or(true) {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    out
}

/// Fit `(X^T W X + ridge I) beta = X^T W y` over [intercept | masks].
///
/// Returns the per-segment coefficients (intercept excluded). The
/// intercept column is not regularized.
fn fit_weighted_ridge(
    masks: &[Vec<bool>],
    targets: &[f32],
    sample_weights: &[f64],
    ridge: f64,
) -> Result<Vec<f64>> {
    let n_features = masks.first().map(|m| m.len()).unwrap_or(0) + 1;
    let mut xtx = vec![vec![0.0f64; n_features]; n_features];
    let mut xty = vec![0.0f64; n_features];

    for ((mask, &target), &weight) in masks.iter().zip(targets).zip(sample_weights) {
        let mut row = Vec::with_capacity(n_features);
        row.push(1.0f64);
        row.extend(mask.iter().map(|&on| if on { 1.0 } else { 0.0 }));

        for i in 0..n_features {
            let wx = weight * row[i];
            for j in i..n_features {
                xtx[i][j] += wx * row[j];
            }
            xty[i] += wx * f64::from(target);
        }
    }
    // Mirror the upper triangle
    for i in 0..n_features {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }
    // Regularize everything but the intercept
    for (i, row) in xtx.iter_mut().enumerate().skip(1) {
        row[i] += ridge;
    }

    let beta = solve_linear(xtx, xty)?;
    Ok(beta[1..].to_vec())
}

/// Solve a dense symmetric system by Gaussian elimination with partial
/// pivoting.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        // Pivot
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < 1e-12 {
            return Err(ExplainError::SurrogateFit(
                "singular system: not enough independent samples".into(),
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution
    let mut x = vec![0.0f64; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for col in (row + 1)..n {
            sum -= a[row][col] * x[col];
        }
        x[row] = sum / a[row][row];
    }
    Ok(x)
}

fn build_summary(
    selected: &[u32],
    segments: &xmed_imaging::SegmentMap,
    image: &RgbImage,
) -> String {
    if selected.is_empty() {
        return "No region showed a positive local association with the predicted class"
            .to_string();
    }

    let (width, height) = image.dimensions();
    let total = (width * height) as f32;
    let area: usize = selected.iter().map(|&l| segments.segment_area(l)).sum();
    let coverage = area as f32 / total * 100.0;

    // Sector of the selected regions' combined mass
    let mut mass = vec![0.0f32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            if selected.contains(&segments.label_at(x, y)) {
                mass[(y * width + x) as usize] = 1.0;
            }
        }
    }
    let sector = sector_phrase(&mass, width as usize, height as usize);

    format!(
        "The local surrogate isolates {} supporting region(s) covering {:.0}% of the section, concentrated in the {} area",
        selected.len(),
        coverage,
        sector
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Left half red, right half blue.
    fn two_tone(size: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, _| {
            if x < size / 2 {
                Rgb([220, 30, 30])
            } else {
                Rgb([30, 30, 220])
            }
        })
    }

    /// Prediction function scoring a variant by the fraction of red
    /// pixels still visible: class 0 probability rises with visible red.
    fn red_fraction_predict(images: &[RgbImage]) -> Result<Vec<Vec<f32>>> {
        Ok(images
            .iter()
            .map(|img| {
                let red = img
                    .pixels()
                    .filter(|p| p.0[0] > 128 && p.0[2] < 128)
                    .count() as f32;
                let total = (img.width() * img.height()) as f32;
                let p = (red / total).clamp(0.0, 1.0);
                vec![p, 1.0 - p]
            })
            .collect())
    }

    fn test_config() -> SurrogateConfig {
        SurrogateConfig {
            num_samples: 64,
            top_segments: 3,
            seed: Some(Seed::new(42)),
            slic: SlicConfig {
                n_segments: 16,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_surrogate_highlights_supporting_half() {
        let image = two_tone(32);
        let prediction = Prediction::from_probs(vec![0.8, 0.2]).unwrap();

        let artifact =
            surrogate_mask(red_fraction_predict, &image, &prediction, &test_config()).unwrap();

        assert_eq!(artifact.method, ExplanationMethod::SurrogateMask);
        assert_eq!(artifact.class_index, 0);
        assert_eq!(artifact.dimensions(), (32, 32));

        // Boundary pixels must only appear on the red (left) half,
        // whose visibility drives class 0
        let changed_right = artifact
            .image
            .enumerate_pixels()
            .filter(|(x, _, p)| *x >= 20 && **p == BOUNDARY_COLOR)
            .count();
        assert_eq!(changed_right, 0);
    }

    #[test]
    fn test_surrogate_is_reproducible_with_seed() {
        let image = two_tone(32);
        let prediction = Prediction::from_probs(vec![0.8, 0.2]).unwrap();
        let config = test_config();

        let a = surrogate_mask(red_fraction_predict, &image, &prediction, &config).unwrap();
        let b = surrogate_mask(red_fraction_predict, &image, &prediction, &config).unwrap();

        assert_eq!(a.image.as_raw(), b.image.as_raw());
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn test_surrogate_surfaces_prediction_shape_error() {
        let image = two_tone(16);
        let prediction = Prediction::from_probs(vec![0.8, 0.2]).unwrap();

        let short_predict =
            |images: &[RgbImage]| -> Result<Vec<Vec<f32>>> { Ok(vec![vec![0.5; 2]; images.len() / 2]) };

        let result = surrogate_mask(short_predict, &image, &prediction, &test_config());
        assert!(matches!(result, Err(ExplainError::PredictionShape(_))));
    }

    #[test]
    fn test_surrogate_surfaces_prediction_failure() {
        let image = two_tone(16);
        let prediction = Prediction::from_probs(vec![0.8, 0.2]).unwrap();

        let failing_predict = |_: &[RgbImage]| -> Result<Vec<Vec<f32>>> {
            Err(ExplainError::PredictionFailed("backend down".into()))
        };

        let result = surrogate_mask(failing_predict, &image, &prediction, &test_config());
        assert!(matches!(result, Err(ExplainError::PredictionFailed(_))));
    }

    #[test]
    fn test_surrogate_rejects_zero_samples() {
        let image = two_tone(16);
        let prediction = Prediction::from_probs(vec![0.8, 0.2]).unwrap();
        let config = SurrogateConfig {
            num_samples: 0,
            ..test_config()
        };

        let result = surrogate_mask(red_fraction_predict, &image, &prediction, &config);
        assert!(matches!(result, Err(ExplainError::InvalidConfig(_))));
    }

    #[test]
    fn test_solve_linear_known_system() {
        // 2x + y = 5; x + 3y = 10 -> x = 1, y = 3
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let b = vec![5.0, 10.0];
        let x = solve_linear(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 3.0).abs() < 1e-9);
    }
}
