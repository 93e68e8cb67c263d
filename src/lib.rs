//! # stickerslicer
//!
//! A library for slicing a single image into an evenly divided grid of
//! chat-sticker PNGs, with optional background removal.
//!
//! Each grid cell is resized into the LINE sticker envelope (fit mode),
//! two cover images are derived from the top-left cell (pad mode), and
//! everything is packaged into a single downloadable ZIP archive.
//!
//! ## Example
//!
//! ```no_run
//! use stickerslicer::{Config, Slicer};
//!
//! # fn main() -> stickerslicer::Result<()> {
//! let config = Config::default();
//! let mut slicer = Slicer::new(config)?;
//!
//! let output = slicer.process("sheet.png")?;
//! std::fs::write("sheet_stickers.zip", &output.archive)?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod preview;

pub use error::{Error, Result};
pub use pipeline::{Config, RunOutput, Slice, Slicer};
