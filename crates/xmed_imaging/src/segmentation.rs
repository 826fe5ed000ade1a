//! SLIC superpixel segmentation and segment boundary drawing.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{ImagingError, Result};

/// Boundary color drawn between segments (yellow).
pub const BOUNDARY_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

/// Configuration for SLIC superpixel segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlicConfig {
    /// Approximate number of superpixels to produce.
    pub n_segments: usize,
    /// Trade-off between color similarity and spatial proximity. Higher
    /// values produce more compact, grid-like segments.
    pub compactness: f32,
    /// Number of assignment/update iterations.
    pub iterations: usize,
}

impl Default for SlicConfig {
    fn default() -> Self {
        Self {
            n_segments: 64,
            compactness: 10.0,
            iterations: 10,
        }
    }
}

/// A per-pixel segment label map.
///
/// Labels are consecutive starting at 0; dimensions match the source
/// image. Segmentation is deterministic: centers are grid-initialized
/// and refined by plain k-means, so the same image and config always
/// produce the same map.
#[derive(Debug, Clone)]
pub struct SegmentMap {
    labels: Vec<u32>,
    width: u32,
    height: u32,
    n_segments: usize,
}

impl SegmentMap {
    /// Map width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Map height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of distinct segments.
    #[must_use]
    pub fn n_segments(&self) -> usize {
        self.n_segments
    }

    /// Segment label at a pixel.
    #[must_use]
    pub fn label_at(&self, x: u32, y: u32) -> u32 {
        self.labels[(y * self.width + x) as usize]
    }

    /// Number of pixels belonging to a segment.
    #[must_use]
    pub fn segment_area(&self, label: u32) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Centroid (x, y) of a segment, in pixels.
    #[must_use]
    pub fn segment_centroid(&self, label: u32) -> Option<(f32, f32)> {
        let mut sx = 0.0f32;
        let mut sy = 0.0f32;
        let mut n = 0usize;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.label_at(x, y) == label {
                    sx += x as f32;
                    sy += y as f32;
                    n += 1;
                }
            }
        }
        if n == 0 {
            None
        } else {
            Some((sx / n as f32, sy / n as f32))
        }
    }
}

#[derive(Clone)]
struct Cluster {
    x: f32,
    y: f32,
    rgb: [f32; 3],
}

/// Segment an image into superpixels with SLIC.
///
/// Grid-seeded k-means over (R, G, B, x, y) features. The distance is
/// `d_color^2 + (compactness / interval)^2 * d_space^2`, with each
/// cluster searching a 2-interval window around its center. Labels are
/// compacted to consecutive values before returning.
///
/// # Arguments
///
/// * `image` - Source RGB image.
/// * `config` - Segmentation parameters.
///
/// # Returns
///
/// A [`SegmentMap`] with the same dimensions as the image.
pub fn slic(image: &RgbImage, config: &SlicConfig) -> Result<SegmentMap> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return Err(ImagingError::Segmentation("empty image".into()));
    }
    if config.n_segments == 0 {
        return Err(ImagingError::Segmentation(
            "n_segments must be positive".into(),
        ));
    }

    // Grid interval between initial centers
    let interval = ((w * h) as f32 / config.n_segments as f32).sqrt().max(1.0);

    // Initialize cluster centers on a regular grid
    let mut clusters = Vec::new();
    let mut cy = interval / 2.0;
    while cy < h as f32 {
        let mut cx = interval / 2.0;
        while cx < w as f32 {
            let px = image.get_pixel(cx as u32, cy as u32).0;
            clusters.push(Cluster {
                x: cx,
                y: cy,
                rgb: [px[0] as f32, px[1] as f32, px[2] as f32],
            });
            cx += interval;
        }
        cy += interval;
    }

    let spatial_weight = (config.compactness / interval) * (config.compactness / interval);
    let mut labels = vec![0u32; w * h];
    let mut distances = vec![f32::INFINITY; w * h];

    for _ in 0..config.iterations.max(1) {
        distances.iter_mut().for_each(|d| *d = f32::INFINITY);

        // Assignment: each cluster scans a 2-interval window
        for (ci, cluster) in clusters.iter().enumerate() {
            let x0 = (cluster.x - 2.0 * interval).max(0.0) as usize;
            let x1 = ((cluster.x + 2.0 * interval) as usize).min(w - 1);
            let y0 = (cluster.y - 2.0 * interval).max(0.0) as usize;
            let y1 = ((cluster.y + 2.0 * interval) as usize).min(h - 1);

            for y in y0..=y1 {
                for x in x0..=x1 {
                    let px = image.get_pixel(x as u32, y as u32).0;
                    let dc = (px[0] as f32 - cluster.rgb[0]).powi(2)
                        + (px[1] as f32 - cluster.rgb[1]).powi(2)
                        + (px[2] as f32 - cluster.rgb[2]).powi(2);
                    let ds = (x as f32 - cluster.x).powi(2) + (y as f32 - cluster.y).powi(2);
                    let d = dc + spatial_weight * ds;

                    let idx = y * w + x;
                    if d < distances[idx] {
                        distances[idx] = d;
                        labels[idx] = ci as u32;
                    }
                }
            }
        }

        // Pixels outside every window (possible for extreme configs) are
        // assigned to the nearest center by position.
        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                if distances[idx].is_infinite() {
                    let mut best = 0;
                    let mut best_d = f32::INFINITY;
                    for (ci, cluster) in clusters.iter().enumerate() {
                        let ds =
                            (x as f32 - cluster.x).powi(2) + (y as f32 - cluster.y).powi(2);
                        if ds < best_d {
                            best_d = ds;
                            best = ci;
                        }
                    }
                    labels[idx] = best as u32;
                }
            }
        }

        // Update: recompute cluster means
        let mut sums = vec![[0.0f32; 6]; clusters.len()];
        for y in 0..h {
            for x in 0..w {
                let ci = labels[y * w + x] as usize;
                let px = image.get_pixel(x as u32, y as u32).0;
                sums[ci][0] += x as f32;
                sums[ci][1] += y as f32;
                sums[ci][2] += px[0] as f32;
                sums[ci][3] += px[1] as f32;
                sums[ci][4] += px[2] as f32;
                sums[ci][5] += 1.0;
            }
        }
        for (cluster, sum) in clusters.iter_mut().zip(&sums) {
            if sum[5] > 0.0 {
                cluster.x = sum[0] / sum[5];
                cluster.y = sum[1] / sum[5];
                cluster.rgb = [sum[2] / sum[5], sum[3] / sum[5], sum[4] / sum[5]];
            }
        }
    }

    // Compact labels to consecutive values
    let mut remap = vec![u32::MAX; clusters.len()];
    let mut next = 0u32;
    for label in labels.iter_mut() {
        let old = *label as usize;
        if remap[old] == u32::MAX {
            remap[old] = next;
            next += 1;
        }
        *label = remap[old];
    }

    Ok(SegmentMap {
        labels,
        width,
        height,
        n_segments: next as usize,
    })
}

/// Draw boundaries between all segments onto a copy of the image.
#[must_use]
pub fn draw_boundaries(image: &RgbImage, segments: &SegmentMap, color: Rgb<u8>) -> RgbImage {
    let mut out = image.clone();
    for y in 0..segments.height() {
        for x in 0..segments.width() {
            if is_boundary(segments, x, y) {
                out.put_pixel(x, y, color);
            }
        }
    }
    out
}

/// Draw boundaries around a selected subset of segments only.
///
/// A pixel is a boundary pixel when it belongs to a selected segment and
/// any 4-neighbor carries a different label.
#[must_use]
pub fn draw_selected_boundaries(
    image: &RgbImage,
    segments: &SegmentMap,
    selected: &[u32],
    color: Rgb<u8>,
) -> RgbImage {
    let mut out = image.clone();
    for y in 0..segments.height() {
        for x in 0..segments.width() {
            if selected.contains(&segments.label_at(x, y)) && is_boundary(segments, x, y) {
                out.put_pixel(x, y, color);
            }
        }
    }
    out
}

fn is_boundary(segments: &SegmentMap, x: u32, y: u32) -> bool {
    let label = segments.label_at(x, y);
    let (w, h) = (segments.width(), segments.height());

    (x > 0 && segments.label_at(x - 1, y) != label)
        || (x + 1 < w && segments.label_at(x + 1, y) != label)
        || (y > 0 && segments.label_at(x, y - 1) != label)
        || (y + 1 < h && segments.label_at(x, y + 1) != label)
}
