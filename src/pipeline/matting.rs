//! Background matting via U²-Net salient-object segmentation.

use image::imageops::{self, FilterType};
use image::GrayImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::SourceImage;

/// Matte tensor type (1, 1, 320, 320) saliency map.
pub type MatteTensor = Array4<f32>;

/// U²-Net native input resolution.
const U2NET_SIZE: u32 = 320;

/// ImageNet channel means/stds used by the U²-Net preprocessing.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Replace the source with a background-removed variant.
///
/// The predicted foreground matte is multiplied into the alpha channel;
/// color channels are untouched. This is all-or-nothing preprocessing: the
/// returned image stands in for the original source for every later stage.
///
/// # Errors
///
/// Returns an error if inference fails.
pub fn remove_background(session: &mut Session, source: &SourceImage) -> Result<SourceImage> {
    let (width, height) = source.dimensions();

    let input = image_to_tensor(source);
    let matte = predict_matte(session, &input)?;
    let mask = matte_to_mask(&matte, width, height);

    Ok(apply_mask(source, &mask))
}

/// Convert the source to a normalized NCHW tensor at U²-Net resolution.
#[allow(clippy::cast_possible_truncation)]
fn image_to_tensor(source: &SourceImage) -> Array4<f32> {
    let resized = imageops::resize(source, U2NET_SIZE, U2NET_SIZE, FilterType::Lanczos3);

    let size = U2NET_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for y in 0..size {
        for x in 0..size {
            // Safe: x and y are bounded by U2NET_SIZE (320) which fits in u32
            let pixel = resized.get_pixel(x as u32, y as u32);
            for ch in 0..3 {
                let value = f32::from(pixel[ch]) / 255.0;
                tensor[[0, ch, y, x]] = (value - MEAN[ch]) / STD[ch];
            }
        }
    }

    tensor
}

/// Run the segmentation network and return its fused saliency map.
fn predict_matte(session: &mut Session, input: &Array4<f32>) -> Result<MatteTensor> {
    let input_value =
        Tensor::from_array(input.clone()).map_err(|source| Error::Inference { source })?;

    let outputs = session
        .run(ort::inputs![input_value])
        .map_err(|source| Error::Inference { source })?;

    // First output is the fused map (d0); the auxiliary side outputs are ignored
    let output = outputs
        .values()
        .next()
        .ok_or_else(|| Error::ShapeMismatch {
            expected: "saliency map output".to_string(),
            actual: "no output".to_string(),
        })?;

    extract_array4(&output)
}

/// Convert a saliency map into a full-resolution alpha mask.
///
/// The map is min-max normalized (U²-Net outputs are not calibrated to a
/// fixed range) and resized back to the source dimensions bilinearly.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn matte_to_mask(matte: &MatteTensor, width: u32, height: u32) -> GrayImage {
    let (min, max) = matte.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    let range = max - min;

    let (_, _, map_h, map_w) = matte.dim();
    let mut mask = GrayImage::new(map_w as u32, map_h as u32);

    for y in 0..map_h {
        for x in 0..map_w {
            let value = if range > f32::EPSILON {
                (matte[[0, 0, y, x]] - min) / range
            } else {
                0.0
            };
            // Safe: clamped to [0, 255] before casting
            let level = (value * 255.0).clamp(0.0, 255.0) as u8;
            mask.put_pixel(x as u32, y as u32, image::Luma([level]));
        }
    }

    imageops::resize(&mask, width, height, FilterType::Triangle)
}

/// Multiply the mask into the source's alpha channel.
fn apply_mask(source: &SourceImage, mask: &GrayImage) -> SourceImage {
    let mut out = source.clone();

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let matte = u16::from(mask.get_pixel(x, y)[0]);
        let alpha = u16::from(pixel[3]);
        #[allow(clippy::cast_possible_truncation)]
        {
            pixel[3] = ((alpha * matte) / 255) as u8;
        }
    }

    out
}

/// Extract a 4D array from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_array4(value: &ort::value::ValueRef<'_>) -> Result<Array4<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Safe: tensor dimensions are always non-negative and within bounds
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    if dims.len() != 4 {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    }

    Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{dims:?}"),
            actual: "reshape failed".to_string(),
        }
    })
}
