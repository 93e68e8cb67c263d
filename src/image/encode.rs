//! Image encoding utilities.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::error::{Error, Result};

/// Encode a rendered canvas as PNG bytes.
///
/// PNG is the single output format: lossless and alpha-capable, which the
/// transparent pad margins and background-removed sources both require.
/// `name` is the archive entry name the buffer is destined for; it only
/// appears in the error message.
///
/// # Errors
///
/// Returns an error if the encoder fails to serialize the canvas.
pub fn encode_png(canvas: &RgbaImage, name: &str) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());

    canvas
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|source| Error::ImageEncode {
            name: name.to_string(),
            source,
        })?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Eight-byte PNG file signature.
    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

    #[test]
    fn test_encode_produces_png() {
        let canvas = RgbaImage::new(4, 4);
        let bytes = encode_png(&canvas, "01.png").unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_encode_roundtrip_preserves_alpha() {
        let mut canvas = RgbaImage::new(2, 2);
        canvas.put_pixel(0, 0, image::Rgba([255, 0, 0, 128]));

        let bytes = encode_png(&canvas, "01.png").unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0)[3], 128);
        assert_eq!(decoded.get_pixel(1, 1)[3], 0);
    }
}
