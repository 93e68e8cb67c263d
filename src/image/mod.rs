//! Image decoding and encoding utilities.

mod encode;
mod load;

pub use encode::encode_png;
pub use load::{load_image, load_image_from_bytes};

/// Decoded source raster in RGBA. Created once per run and treated as
/// read-only by every later stage.
pub type SourceImage = image::RgbaImage;
