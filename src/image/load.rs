//! Image loading utilities.

use std::path::Path;

use crate::error::{Error, Result};

use super::SourceImage;

/// Load an image from disk and convert it to RGBA.
///
/// The alpha channel is always materialized so that a background-removed
/// replacement source (which carries transparency) and a plain upload go
/// through the same rendering path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<SourceImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(img.to_rgba8())
}

/// Decode an in-memory image (any supported raster format) to RGBA.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<SourceImage> {
    let img =
        image::load_from_memory(bytes).map_err(|source| Error::ImageDecode { source })?;

    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat};

    use super::*;

    #[test]
    fn test_decode_from_bytes() {
        let img = DynamicImage::new_rgb8(20, 10);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();

        let decoded = load_image_from_bytes(&buf.into_inner()).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = load_image_from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, Error::ImageDecode { .. }));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = load_image("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, Error::ImageLoad { .. }));
    }
}
