//! Classifier trait with an explicit feature tap.

use burn::prelude::*;
use burn::tensor::activation::softmax;

/// Trait for tissue classification models.
///
/// The forward pass is split at the feature layer the gradient-weighted
/// activation visualizer taps: [`features`](Self::features) runs the
/// backbone up to and including that layer, [`head`](Self::head) runs the
/// remainder down to class logits. Full inference composes the two.
///
/// The split is part of the contract rather than an implementation
/// detail: it guarantees the visualizer reads activations from the same
/// layer for every model, and lets tests substitute a stub classifier.
pub trait TissueClassifier<B: Backend> {
    /// Backbone forward up to the designated feature layer.
    ///
    /// # Arguments
    ///
    /// * `x` - Input tensor of shape (batch, channels, height, width)
    ///
    /// # Returns
    ///
    /// Feature activations of shape (batch, feat_channels, feat_h, feat_w).
    fn features(&self, x: Tensor<B, 4>) -> Tensor<B, 4>;

    /// Remainder of the network, from feature activations to logits.
    ///
    /// # Returns
    ///
    /// Logits tensor of shape (batch, n_classes).
    fn head(&self, features: Tensor<B, 4>) -> Tensor<B, 2>;

    /// Number of output classes.
    fn n_classes(&self) -> usize;

    /// Full forward pass returning logits.
    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        self.head(self.features(x))
    }

    /// Full forward pass returning softmax probabilities.
    fn forward_probs(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(x), 1)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_trait_definition() {
        // Implementations are exercised in the model and explain crates.
    }
}
