//! Resize + normalization transform feeding the classifier.

use burn::prelude::*;
use image::imageops::FilterType;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Resize + per-channel normalization producing classifier input tensors.
///
/// Images are resized to a square `size` with bilinear filtering, scaled
/// to `[0, 1]`, and normalized per channel as `(v - mean) / std`. Output
/// layout is `(batch, 3, size, size)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTransform {
    /// Target square edge length in pixels.
    pub size: u32,
    /// Per-channel mean subtracted after scaling to [0, 1].
    pub mean: [f32; 3],
    /// Per-channel standard deviation divided after mean subtraction.
    pub std: [f32; 3],
}

impl Default for ImageTransform {
    /// 256x256 with ImageNet statistics, matching the classifier's
    /// training-time preprocessing.
    fn default() -> Self {
        Self {
            size: 256,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

impl ImageTransform {
    /// Create a transform with a custom edge length.
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Resize an image to the target square without normalizing.
    ///
    /// This is the base image explanation overlays are drawn on.
    #[must_use]
    pub fn resize(&self, image: &RgbImage) -> RgbImage {
        if image.dimensions() == (self.size, self.size) {
            image.clone()
        } else {
            image::imageops::resize(image, self.size, self.size, FilterType::Triangle)
        }
    }

    /// Convert one image to a normalized `(1, 3, size, size)` tensor.
    #[must_use]
    pub fn to_tensor<B: Backend>(&self, image: &RgbImage, device: &B::Device) -> Tensor<B, 4> {
        self.to_batch_tensor(std::slice::from_ref(image), device)
    }

    /// Convert a batch of images to a normalized `(n, 3, size, size)` tensor.
    #[must_use]
    pub fn to_batch_tensor<B: Backend>(
        &self,
        images: &[RgbImage],
        device: &B::Device,
    ) -> Tensor<B, 4> {
        let size = self.size as usize;
        let mut data = Vec::with_capacity(images.len() * 3 * size * size);

        for image in images {
            let resized = self.resize(image);
            // Channel-major (NCHW) layout
            for c in 0..3 {
                for y in 0..size {
                    for x in 0..size {
                        let v = resized.get_pixel(x as u32, y as u32).0[c] as f32 / 255.0;
                        data.push((v - self.mean[c]) / self.std[c]);
                    }
                }
            }
        }

        Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([
            images.len(),
            3,
            size,
            size,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use image::Rgb;

    #[test]
    fn test_default_is_256_imagenet() {
        let t = ImageTransform::default();
        assert_eq!(t.size, 256);
        assert!((t.mean[0] - 0.485).abs() < 1e-6);
        assert!((t.std[2] - 0.225).abs() < 1e-6);
    }

    #[test]
    fn test_resize_dimensions() {
        let t = ImageTransform::new(64);
        let img = RgbImage::from_pixel(100, 80, Rgb([10, 20, 30]));
        let resized = t.resize(&img);
        assert_eq!(resized.dimensions(), (64, 64));
    }

    #[test]
    fn test_tensor_shape_and_normalization() {
        let t = ImageTransform::new(8);
        // Pixel value 255 in every channel
        let img = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));

        let device = Default::default();
        let tensor = t.to_tensor::<NdArray>(&img, &device);
        assert_eq!(tensor.dims(), [1, 3, 8, 8]);

        // Channel 0: (1.0 - 0.485) / 0.229
        let expected = (1.0 - 0.485) / 0.229;
        let first: f32 = tensor
            .slice([0..1, 0..1, 0..1, 0..1])
            .into_scalar()
            .elem();
        assert!((first - expected).abs() < 1e-5);
    }

    #[test]
    fn test_batch_tensor_shape() {
        let t = ImageTransform::new(8);
        let img = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let device = Default::default();
        let tensor = t.to_batch_tensor::<NdArray>(&[img.clone(), img], &device);
        assert_eq!(tensor.dims(), [2, 3, 8, 8]);
    }
}
