//! ResNet tissue classifier for histopathology images.

use burn::nn::{
    conv::{Conv2d, Conv2dConfig},
    pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
    BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use xmed_core::TissueClassifier;

/// Configuration for the [`HistoResNet`] classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoResNetConfig {
    /// Number of input color channels.
    pub in_channels: usize,
    /// Number of output classes.
    pub n_classes: usize,
    /// Base number of filters in the first stage.
    pub base_filters: usize,
    /// Number of bottleneck blocks in each of the four stages.
    pub layers: Vec<usize>,
    /// Channel expansion factor of the bottleneck blocks.
    pub expansion: usize,
}

impl Default for HistoResNetConfig {
    /// ResNet-50 for 3-channel input and the five-class tissue mapping.
    fn default() -> Self {
        Self::resnet50(5)
    }
}

impl HistoResNetConfig {
    /// ResNet-50: four stages of [3, 4, 6, 3] bottleneck blocks with
    /// expansion 4 and a classification head sized to `n_classes`.
    #[must_use]
    pub fn resnet50(n_classes: usize) -> Self {
        Self {
            in_channels: 3,
            n_classes,
            base_filters: 64,
            layers: vec![3, 4, 6, 3],
            expansion: 4,
        }
    }

    /// Set the base filter count.
    #[must_use]
    pub fn with_base_filters(mut self, base_filters: usize) -> Self {
        self.base_filters = base_filters;
        self
    }

    /// Set the per-stage block counts.
    #[must_use]
    pub fn with_layers(mut self, layers: Vec<usize>) -> Self {
        self.layers = layers;
        self
    }

    /// Initialize the model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> HistoResNet<B> {
        HistoResNet::new(self.clone(), device)
    }
}

/// Bottleneck residual block: 1x1 reduce, 3x3, 1x1 expand.
#[derive(Module, Debug)]
struct Bottleneck<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
    conv3: Conv2d<B>,
    bn3: BatchNorm<B, 2>,
    downsample_conv: Option<Conv2d<B>>,
    downsample_bn: Option<BatchNorm<B, 2>>,
}

impl<B: Backend> Bottleneck<B> {
    fn new(
        in_channels: usize,
        base_channels: usize,
        stride: usize,
        expansion: usize,
        device: &B::Device,
    ) -> Self {
        let out_channels = base_channels * expansion;

        let conv1 = Conv2dConfig::new([in_channels, base_channels], [1, 1])
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(base_channels).init(device);

        let conv2 = Conv2dConfig::new([base_channels, base_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let bn2 = BatchNormConfig::new(base_channels).init(device);

        let conv3 = Conv2dConfig::new([base_channels, out_channels], [1, 1])
            .with_bias(false)
            .init(device);
        let bn3 = BatchNormConfig::new(out_channels).init(device);

        // Projection shortcut when shape changes
        let (downsample_conv, downsample_bn) = if stride != 1 || in_channels != out_channels {
            let conv = Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device);
            let bn = BatchNormConfig::new(out_channels).init(device);
            (Some(conv), Some(bn))
        } else {
            (None, None)
        };

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
            conv3,
            bn3,
            downsample_conv,
            downsample_bn,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let relu = Relu::new();
        let identity = x.clone();

        let out = self.conv1.forward(x);
        let out = self.bn1.forward(out);
        let out = relu.forward(out);

        let out = self.conv2.forward(out);
        let out = self.bn2.forward(out);
        let out = relu.forward(out);

        let out = self.conv3.forward(out);
        let out = self.bn3.forward(out);

        let identity = if let (Some(ref conv), Some(ref bn)) =
            (&self.downsample_conv, &self.downsample_bn)
        {
            bn.forward(conv.forward(identity))
        } else {
            identity
        };

        relu.forward(out + identity)
    }
}

/// ResNet tissue classifier.
///
/// Standard ResNet layout: 7x7/2 stem convolution, 3x3/2 max pool, four
/// bottleneck stages, global average pooling, and a final linear layer
/// replaced to match the diagnostic class count.
///
/// The forward pass is split for the [`TissueClassifier`] trait:
/// [`features`](TissueClassifier::features) runs through the third stage
/// (the layer the activation visualizer taps), and
/// [`head`](TissueClassifier::head) runs the fourth stage plus the
/// classification head.
#[derive(Module, Debug)]
pub struct HistoResNet<B: Backend> {
    stem_conv: Conv2d<B>,
    stem_bn: BatchNorm<B, 2>,
    maxpool: MaxPool2d,
    stage1: Vec<Bottleneck<B>>,
    stage2: Vec<Bottleneck<B>>,
    stage3: Vec<Bottleneck<B>>,
    stage4: Vec<Bottleneck<B>>,
    gap: AdaptiveAvgPool2d,
    fc: Linear<B>,
    #[module(skip)]
    n_classes: usize,
}

impl<B: Backend> HistoResNet<B> {
    /// Create a new model from a config.
    pub fn new(config: HistoResNetConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        let stem_conv = Conv2dConfig::new([config.in_channels, base], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let stem_bn = BatchNormConfig::new(base).init(device);

        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let stage_channels = [base, base * 2, base * 4, base * 8];
        let stage_strides = [1, 2, 2, 2];
        let n_blocks = [
            config.layers.first().copied().unwrap_or(3),
            config.layers.get(1).copied().unwrap_or(4),
            config.layers.get(2).copied().unwrap_or(6),
            config.layers.get(3).copied().unwrap_or(3),
        ];

        let mut stages: Vec<Vec<Bottleneck<B>>> = Vec::with_capacity(4);
        let mut in_channels = base;
        for s in 0..4 {
            let mut blocks = Vec::with_capacity(n_blocks[s]);
            for b in 0..n_blocks[s] {
                let stride = if b == 0 { stage_strides[s] } else { 1 };
                blocks.push(Bottleneck::new(
                    in_channels,
                    stage_channels[s],
                    stride,
                    config.expansion,
                    device,
                ));
                in_channels = stage_channels[s] * config.expansion;
            }
            stages.push(blocks);
        }

        let stage4 = stages.pop().unwrap_or_default();
        let stage3 = stages.pop().unwrap_or_default();
        let stage2 = stages.pop().unwrap_or_default();
        let stage1 = stages.pop().unwrap_or_default();

        let gap = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let final_channels = base * 8 * config.expansion;
        let fc = LinearConfig::new(final_channels, config.n_classes).init(device);

        Self {
            stem_conv,
            stem_bn,
            maxpool,
            stage1,
            stage2,
            stage3,
            stage4,
            gap,
            fc,
            n_classes: config.n_classes,
        }
    }
}

impl<B: Backend> TissueClassifier<B> for HistoResNet<B> {
    fn features(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let relu = Relu::new();

        let out = self.stem_conv.forward(x);
        let out = self.stem_bn.forward(out);
        let out = relu.forward(out);
        let mut out = self.maxpool.forward(out);

        for block in &self.stage1 {
            out = block.forward(out);
        }
        for block in &self.stage2 {
            out = block.forward(out);
        }
        for block in &self.stage3 {
            out = block.forward(out);
        }
        out
    }

    fn head(&self, features: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut out = features;
        for block in &self.stage4 {
            out = block.forward(out);
        }

        let out = self.gap.forward(out);
        let [batch, channels, _, _] = out.dims();
        let out = out.reshape([batch, channels]);
        self.fc.forward(out)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    /// Small config keeping unit tests fast.
    fn tiny_config() -> HistoResNetConfig {
        HistoResNetConfig::resnet50(3)
            .with_base_filters(8)
            .with_layers(vec![1, 1, 1, 1])
    }

    #[test]
    fn test_resnet50_config_defaults() {
        let config = HistoResNetConfig::default();
        assert_eq!(config.n_classes, 5);
        assert_eq!(config.layers, vec![3, 4, 6, 3]);
        assert_eq!(config.expansion, 4);
        assert_eq!(config.base_filters, 64);
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let model: HistoResNet<NdArray> = tiny_config().init(&device);

        let x = Tensor::<NdArray, 4>::zeros([1, 3, 32, 32], &device);
        let feats = model.features(x.clone());
        // 32 -> stem /2 -> pool /2 -> stage2 /2 -> stage3 /2
        assert_eq!(feats.dims(), [1, 8 * 4 * 4, 2, 2]);

        let logits = model.forward(x);
        assert_eq!(logits.dims(), [1, 3]);
        assert_eq!(model.n_classes(), 3);
    }

    #[test]
    fn test_forward_probs_sum_to_one() {
        let device = Default::default();
        let model: HistoResNet<NdArray> = tiny_config().init(&device);

        let x = Tensor::<NdArray, 4>::zeros([1, 3, 32, 32], &device);
        let probs = model.forward_probs(x);
        let sum: f32 = probs.sum().into_scalar().elem();
        assert!((sum - 1.0).abs() < 1e-4);
    }
}
