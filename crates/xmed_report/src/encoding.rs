//! PNG data-URI encoding for embedded report images.

use std::io::Cursor;

use image::{ImageOutputFormat, RgbImage};

use crate::error::{ReportError, Result};

/// Encode an image as a `data:image/png;base64,...` URI.
pub fn png_data_uri(image: &RgbImage, name: &str) -> Result<String> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ReportError::InvalidInput(format!("image '{name}' is empty")));
    }

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(|e| ReportError::ImageEncode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    Ok(format!("data:image/png;base64,{}", base64_encode(&bytes)))
}

fn base64_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let mut buf = [0u8; 3];
        buf[..chunk.len()].copy_from_slice(chunk);

        let n = (u32::from(buf[0]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[2]);

        result.push(ALPHABET[(n >> 18) as usize & 0x3F] as char);
        result.push(ALPHABET[(n >> 12) as usize & 0x3F] as char);

        if chunk.len() > 1 {
            result.push(ALPHABET[(n >> 6) as usize & 0x3F] as char);
        } else {
            result.push('=');
        }

        if chunk.len() > 2 {
            result.push(ALPHABET[n as usize & 0x3F] as char);
        } else {
            result.push('=');
        }
    }

    result
}
