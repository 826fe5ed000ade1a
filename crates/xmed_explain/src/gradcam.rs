//! Gradient-weighted class activation visualization.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use image::RgbImage;
use tracing::debug;
use xmed_core::{tensor_to_vec, Prediction, TissueClassifier};
use xmed_imaging::Heatmap;

use crate::artifact::{sector_phrase, ExplanationArtifact, ExplanationMethod};
use crate::error::{ExplainError, Result};

/// Compute a gradient-weighted class activation overlay.
///
/// The classifier's feature activations are re-rooted as a tracked leaf,
/// the head is run on top of them, and the target-class score is
/// backpropagated to read the gradient at the feature layer. Channel
/// weights are the spatial mean of the gradients; the activation map is
/// the ReLU of the weighted channel sum, min-max normalized, bilinearly
/// upsampled to the base image resolution and blended as a jet heatmap.
///
/// Pure function of its inputs; no side effects.
///
/// # Arguments
///
/// * `model` - The frozen classifier, on an autodiff backend.
/// * `input` - Normalized input tensor of shape (1, 3, H, W).
/// * `base` - The resized, unnormalized original image to overlay on.
/// * `prediction` - The prediction being explained; its class index
///   selects the backpropagated score.
///
/// # Errors
///
/// [`ExplainError::GradientUnavailable`] when the backward pass yields
/// no gradient for the feature layer (e.g. a head that does not depend
/// on the features). This is a hard error: a garbage heatmap is worse
/// than no heatmap.
pub fn grad_cam<B, M>(
    model: &M,
    input: Tensor<B, 4>,
    base: &RgbImage,
    prediction: &Prediction,
) -> Result<ExplanationArtifact>
where
    B: AutodiffBackend,
    M: TissueClassifier<B>,
{
    let class_index = prediction.class_index();
    if class_index >= model.n_classes() {
        return Err(ExplainError::ClassOutOfRange {
            index: class_index,
            n_classes: model.n_classes(),
        });
    }

    // Re-root the feature activations so the backward pass exposes
    // their gradient.
    let features = model.features(input).detach().require_grad();
    let logits = model.head(features.clone());

    let score = logits
        .slice([0..1, class_index..class_index + 1])
        .sum();
    let grads = score.backward();
    let gradient = features
        .grad(&grads)
        .ok_or(ExplainError::GradientUnavailable)?;

    let [_, channels, feat_h, feat_w] = features.dims();
    let activations = tensor_to_vec(features.inner())?;
    let gradients = tensor_to_vec(gradient)?;

    debug!(channels, feat_h, feat_w, class_index, "computed feature gradients");

    // Channel weights: global average pool of the gradients
    let plane = feat_h * feat_w;
    let mut weights = vec![0.0f32; channels];
    for c in 0..channels {
        let offset = c * plane;
        weights[c] = gradients[offset..offset + plane].iter().sum::<f32>() / plane as f32;
    }

    // Weighted channel sum, rectified
    let mut cam = vec![0.0f32; plane];
    for c in 0..channels {
        let offset = c * plane;
        for i in 0..plane {
            cam[i] += weights[c] * activations[offset + i];
        }
    }
    for v in cam.iter_mut() {
        *v = v.max(0.0);
    }

    let (width, height) = base.dimensions();
    let heatmap = Heatmap::new(cam, feat_w, feat_h)?
        .normalize()
        .resize_bilinear(width as usize, height as usize);

    let summary = format!(
        "Class activation is strongest in the {} region of the section",
        sector_phrase(heatmap.values(), width as usize, height as usize)
    );
    let image = heatmap.overlay_on(base)?;

    Ok(ExplanationArtifact {
        method: ExplanationMethod::GradCam,
        class_index,
        image,
        summary,
    })
}
