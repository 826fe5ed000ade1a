//! Decoding and validation of uploaded images.

use std::io::Cursor;
use std::path::Path;

use image::{ColorType, RgbImage};

use crate::error::{ImagingError, Result};

/// Decode an uploaded JPEG/PNG byte buffer into an RGB image.
///
/// Rejection happens before any model work, with distinct errors:
/// unrecognized bytes are [`ImagingError::NotAnImage`], while grayscale
/// inputs are [`ImagingError::UnsupportedChannels`]. An alpha channel is
/// accepted and dropped.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImagingError::NotAnImage(e.to_string()))?;

    if reader.format().is_none() {
        return Err(ImagingError::NotAnImage(
            "unrecognized image format".into(),
        ));
    }

    let decoded = reader
        .decode()
        .map_err(|e| ImagingError::Decode(e.to_string()))?;

    match decoded.color() {
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
            Err(ImagingError::UnsupportedChannels {
                found: "grayscale".into(),
            })
        }
        _ => Ok(decoded.to_rgb8()),
    }
}

/// Load and validate an image from a file path.
pub fn load_image(path: impl AsRef<Path>) -> Result<RgbImage> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgb};

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_rejects_garbage_as_not_an_image() {
        let result = decode_image(b"definitely not image bytes");
        assert!(matches!(result, Err(ImagingError::NotAnImage(_))));
    }

    #[test]
    fn test_rejects_grayscale_as_wrong_channels() {
        let gray = GrayImage::from_pixel(8, 8, Luma([128]));
        let result = decode_image(&png_bytes(DynamicImage::ImageLuma8(gray)));
        assert!(matches!(
            result,
            Err(ImagingError::UnsupportedChannels { .. })
        ));
    }

    #[test]
    fn test_accepts_rgb_png() {
        let rgb = RgbImage::from_pixel(8, 8, Rgb([200, 100, 50]));
        let decoded = decode_image(&png_bytes(DynamicImage::ImageRgb8(rgb))).unwrap();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([200, 100, 50]));
    }

    #[test]
    fn test_accepts_rgba_and_drops_alpha() {
        let rgba = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let decoded = decode_image(&png_bytes(DynamicImage::ImageRgba8(rgba))).unwrap();
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }
}
