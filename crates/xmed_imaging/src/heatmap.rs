//! Heatmap normalization, resizing, colorization and overlay.

use image::{Rgb, RgbImage};

use crate::error::{ImagingError, Result};

/// A single-channel scalar map over an image, row-major.
#[derive(Debug, Clone)]
pub struct Heatmap {
    values: Vec<f32>,
    width: usize,
    height: usize,
}

impl Heatmap {
    /// Create a heatmap from row-major values.
    pub fn new(values: Vec<f32>, width: usize, height: usize) -> Result<Self> {
        if values.len() != width * height {
            return Err(ImagingError::ShapeMismatch(format!(
                "expected {} values for {}x{}, got {}",
                width * height,
                width,
                height,
                values.len()
            )));
        }
        Ok(Self {
            values,
            width,
            height,
        })
    }

    /// Width in cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw values, row-major.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Min-max normalize values to [0, 1].
    ///
    /// A flat map (range below epsilon) is returned unchanged.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let min = self.values.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = self
            .values
            .iter()
            .cloned()
            .fold(f32::NEG_INFINITY, f32::max);
        let range = max - min;

        if range > 1e-8 {
            Self {
                values: self.values.iter().map(|v| (v - min) / range).collect(),
                width: self.width,
                height: self.height,
            }
        } else {
            self.clone()
        }
    }

    /// Bilinearly resize the map to new cell dimensions.
    #[must_use]
    pub fn resize_bilinear(&self, new_width: usize, new_height: usize) -> Self {
        if new_width == self.width && new_height == self.height {
            return self.clone();
        }

        let mut out = Vec::with_capacity(new_width * new_height);
        let sx = self.width.max(1) as f32 / new_width.max(1) as f32;
        let sy = self.height.max(1) as f32 / new_height.max(1) as f32;

        for y in 0..new_height {
            // Sample at cell centers
            let fy = ((y as f32 + 0.5) * sy - 0.5).max(0.0);
            let y0 = (fy as usize).min(self.height - 1);
            let y1 = (y0 + 1).min(self.height - 1);
            let ty = fy - y0 as f32;

            for x in 0..new_width {
                let fx = ((x as f32 + 0.5) * sx - 0.5).max(0.0);
                let x0 = (fx as usize).min(self.width - 1);
                let x1 = (x0 + 1).min(self.width - 1);
                let tx = fx - x0 as f32;

                let top = self.at(x0, y0) * (1.0 - tx) + self.at(x1, y0) * tx;
                let bottom = self.at(x0, y1) * (1.0 - tx) + self.at(x1, y1) * tx;
                out.push(top * (1.0 - ty) + bottom * ty);
            }
        }

        Self {
            values: out,
            width: new_width,
            height: new_height,
        }
    }

    /// Render the map as an RGB image using the jet colormap.
    ///
    /// Each cell becomes a `cell_scale` x `cell_scale` block of pixels, so
    /// the output dimensions are `(width * cell_scale, height * cell_scale)`.
    /// Values are clamped to [0, 1] before lookup.
    #[must_use]
    pub fn colorize(&self, cell_scale: u32) -> RgbImage {
        let scale = cell_scale.max(1);
        let mut img = RgbImage::new(self.width as u32 * scale, self.height as u32 * scale);

        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let cx = (x / scale) as usize;
            let cy = (y / scale) as usize;
            *pixel = Rgb(jet_color(self.at(cx, cy)));
        }

        img
    }

    /// Overlay the map on a base image as a jet-colored heatmap.
    ///
    /// The map is expected to match the base dimensions and hold values
    /// in [0, 1]. The blend is additive in [0, 1] space, renormalized by
    /// the maximum so the result stays in range, then scaled back to u8.
    pub fn overlay_on(&self, base: &RgbImage) -> Result<RgbImage> {
        let (bw, bh) = base.dimensions();
        if (bw as usize, bh as usize) != (self.width, self.height) {
            return Err(ImagingError::ShapeMismatch(format!(
                "heatmap {}x{} does not match base image {}x{}",
                self.width, self.height, bw, bh
            )));
        }

        let mut blended = vec![0.0f32; self.width * self.height * 3];
        let mut max_val = 1e-8f32;

        for (x, y, pixel) in base.enumerate_pixels() {
            let idx = (y as usize * self.width + x as usize) * 3;
            let heat = jet_color(self.at(x as usize, y as usize));
            for c in 0..3 {
                let v = heat[c] as f32 / 255.0 + pixel.0[c] as f32 / 255.0;
                blended[idx + c] = v;
                max_val = max_val.max(v);
            }
        }

        let mut img = RgbImage::new(bw, bh);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let idx = (y as usize * self.width + x as usize) * 3;
            *pixel = Rgb([
                (blended[idx] / max_val * 255.0) as u8,
                (blended[idx + 1] / max_val * 255.0) as u8,
                (blended[idx + 2] / max_val * 255.0) as u8,
            ]);
        }

        Ok(img)
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }
}

/// Jet colormap lookup for a value in [0, 1].
///
/// Low values map to blue, mid to green, high to red.
#[must_use]
pub fn jet_color(value: f32) -> [u8; 3] {
    let v = value.clamp(0.0, 1.0);
    let r = (1.5 - (4.0 * v - 3.0).abs()).clamp(0.0, 1.0);
    let g = (1.5 - (4.0 * v - 2.0).abs()).clamp(0.0, 1.0);
    let b = (1.5 - (4.0 * v - 1.0).abs()).clamp(0.0, 1.0);
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}
