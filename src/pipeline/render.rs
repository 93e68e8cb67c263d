//! Cell rendering: crop, aspect-preserving resize, and PNG encoding.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::Result;
use crate::image::{encode_png, SourceImage};

use super::grid::CellRect;

/// How the scaled content is laid out on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// The canvas shrinks to exactly bound the scaled content. Output
    /// dimensions vary with the crop's aspect ratio; no padding.
    Fit,

    /// The canvas is fixed at the full envelope and the scaled content is
    /// centered on it, leaving transparent margins.
    Pad,
}

/// Output envelope for one rendered image.
#[derive(Debug, Clone, Copy)]
pub struct OutputSpec {
    pub max_width: u32,
    pub max_height: u32,
    pub mode: ResizeMode,
}

/// Render one crop rectangle of the source into an encoded PNG.
///
/// The crop is scaled to fit inside the output envelope while preserving
/// its aspect ratio, laid out per [`ResizeMode`], and encoded losslessly.
/// `name` is the archive entry name, used for error context only.
///
/// # Errors
///
/// Returns an error if the canvas cannot be encoded.
pub fn render_cell(
    source: &SourceImage,
    rect: CellRect,
    spec: OutputSpec,
    name: &str,
) -> Result<Vec<u8>> {
    let canvas = compose(source, rect, spec);
    encode_png(&canvas, name)
}

/// Scale the envelope down to the crop's aspect ratio.
///
/// One dimension stays at its maximum and the other shrinks. The
/// comparison direction decides which one: when the width-derived height
/// would overflow the envelope, height is the binding constraint and the
/// width is recomputed; otherwise (including an exact fit) the width binds
/// and the height is recomputed.
fn scaled_extent(rect: CellRect, spec: OutputSpec) -> (f64, f64) {
    let aspect = rect.sw / rect.sh;

    let mut target_w = f64::from(spec.max_width);
    let mut target_h = f64::from(spec.max_height);

    if target_w / aspect > target_h {
        target_w = target_h * aspect;
    } else {
        target_h = target_w / aspect;
    }

    (target_w, target_h)
}

/// Build the output canvas for one crop rectangle.
fn compose(source: &SourceImage, rect: CellRect, spec: OutputSpec) -> RgbaImage {
    let (target_w, target_h) = scaled_extent(rect, spec);

    // Whole-pixel dimensions only exist at the canvas boundary; the rect
    // itself stays real-valued.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (target_w, target_h) = (
        target_w.round().max(1.0) as u32,
        target_h.round().max(1.0) as u32,
    );

    let crop = sample_region(source, rect);
    let content = imageops::resize(&crop, target_w, target_h, FilterType::Lanczos3);

    match spec.mode {
        ResizeMode::Fit => content,
        ResizeMode::Pad => {
            let mut canvas = RgbaImage::new(spec.max_width, spec.max_height);
            let dx = i64::from(spec.max_width.saturating_sub(target_w) / 2);
            let dy = i64::from(spec.max_height.saturating_sub(target_h) / 2);
            imageops::overlay(&mut canvas, &content, dx, dy);
            canvas
        }
    }
}

/// Copy the crop rectangle out of the source into its own buffer.
///
/// The rectangle is not clamped to the source bounds: pixels outside the
/// source stay fully transparent, matching canvas sampling semantics for
/// out-of-range crops.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn sample_region(source: &SourceImage, rect: CellRect) -> RgbaImage {
    let crop_w = rect.sw.round().max(1.0) as u32;
    let crop_h = rect.sh.round().max(1.0) as u32;

    let x0 = rect.sx.floor() as i64;
    let y0 = rect.sy.floor() as i64;
    let (src_w, src_h) = (i64::from(source.width()), i64::from(source.height()));

    let mut crop = RgbaImage::new(crop_w, crop_h);
    for cy in 0..crop_h {
        let sy = y0 + i64::from(cy);
        if sy < 0 || sy >= src_h {
            continue;
        }
        for cx in 0..crop_w {
            let sx = x0 + i64::from(cx);
            if sx < 0 || sx >= src_w {
                continue;
            }
            crop.put_pixel(cx, cy, *source.get_pixel(sx as u32, sy as u32));
        }
    }

    crop
}
