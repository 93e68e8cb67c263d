//! Slicing pipeline: plan the grid, render every cell, package the results.

use std::path::Path;

use ort::session::Session;

use crate::archive::ArchiveBundle;
use crate::error::{Error, Result};
use crate::image::{load_image, load_image_from_bytes, SourceImage};
use crate::model::{ModelCache, ModelType};
use crate::preview::PreviewHandle;

use super::grid::{self, GridSpec};
use super::matting;
use super::render::{render_cell, OutputSpec, ResizeMode};

/// Per-cell output envelope (LINE sticker size W370 x H320), fit mode.
const CELL_SPEC: OutputSpec = OutputSpec {
    max_width: 370,
    max_height: 320,
    mode: ResizeMode::Fit,
};

/// Main pack cover, padded to a fixed 240x240 square.
const MAIN_COVER_SPEC: OutputSpec = OutputSpec {
    max_width: 240,
    max_height: 240,
    mode: ResizeMode::Pad,
};

/// Chat-tab cover, padded to a fixed 96x74 box.
const TAB_COVER_SPEC: OutputSpec = OutputSpec {
    max_width: 96,
    max_height: 74,
    mode: ResizeMode::Pad,
};

const MAIN_COVER_NAME: &str = "main.png";
const TAB_COVER_NAME: &str = "tab.png";

/// Configuration for one slicing run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of grid rows.
    pub rows: u32,

    /// Number of grid columns.
    pub cols: u32,

    /// Horizontal crop offset in source pixels. May be negative or exceed
    /// the source bounds; out-of-bounds regions render transparent.
    pub offset_x: f64,

    /// Vertical crop offset in source pixels.
    pub offset_y: f64,

    /// Whether to replace the source with a background-removed variant
    /// before slicing.
    pub remove_background: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 4,
            offset_x: 0.0,
            offset_y: 0.0,
            remove_background: false,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// Zero rows or columns are accepted and produce an empty run; only
    /// non-finite offsets are rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !self.offset_x.is_finite() {
            return Err(Error::InvalidParameter {
                name: "offset_x".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }

        if !self.offset_y.is_finite() {
            return Err(Error::InvalidParameter {
                name: "offset_y".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }

        Ok(())
    }

    const fn grid(&self) -> GridSpec {
        GridSpec {
            rows: self.rows,
            cols: self.cols,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        }
    }
}

/// One rendered grid cell.
#[derive(Debug, Clone)]
pub struct Slice {
    /// 1-based sequence number in row-major grid order.
    pub id: u32,

    /// Archive entry name, `{id:02}.png`.
    pub name: String,

    /// Encoded PNG bytes.
    pub png: Vec<u8>,
}

impl Slice {
    /// Write this slice out as an ephemeral preview file.
    ///
    /// The file is removed again when the returned handle is dropped. The
    /// archive never depends on preview lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_preview(&self, dir: &Path) -> Result<PreviewHandle> {
        PreviewHandle::create(dir, &self.name, &self.png)
    }
}

/// Result of a run: the ordered slice list (for live preview) and the
/// finished ZIP archive.
#[derive(Debug)]
pub struct RunOutput {
    pub slices: Vec<Slice>,
    pub archive: Vec<u8>,
}

/// Pipeline orchestrator for slicing one image into a sticker pack.
#[derive(Debug)]
pub struct Slicer {
    config: Config,
    matting_session: Option<Session>,
}

impl Slicer {
    /// Create a new slicer with the given configuration.
    ///
    /// When background removal is enabled this will download the matting
    /// model if it is not already cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the model
    /// cannot be loaded.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing slicer with config: {config:?}");

        let matting_session = if config.remove_background {
            tracing::info!("Loading U²-Net matting model...");
            let cache = ModelCache::new()?;
            Some(cache.load_session(ModelType::U2Net)?)
        } else {
            None
        };

        Ok(Self {
            config,
            matting_session,
        })
    }

    /// Slice an image file into a sticker pack.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be loaded or processing fails.
    pub fn process<P: AsRef<Path>>(&mut self, input_path: P) -> Result<RunOutput> {
        let input_path = input_path.as_ref();

        tracing::info!("Processing image: {}", input_path.display());

        let source = load_image(input_path)?;
        self.run(source)
    }

    /// Slice an in-memory image (any supported raster format).
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be decoded or processing fails.
    pub fn process_bytes(&mut self, bytes: &[u8]) -> Result<RunOutput> {
        let source = load_image_from_bytes(bytes)?;
        self.run(source)
    }

    /// Run stages 2-4 against a decoded source.
    ///
    /// Strictly sequential: each render completes before the next starts,
    /// and any single failure aborts the run with no partial archive.
    fn run(&mut self, source: SourceImage) -> Result<RunOutput> {
        let source = match self.matting_session.as_mut() {
            Some(session) => {
                tracing::info!("Removing background...");
                matting::remove_background(session, &source)?
            }
            None => source,
        };

        let (width, height) = source.dimensions();
        let rects = grid::plan(width, height, self.config.grid());

        tracing::info!(
            "Slicing {width}x{height} into a {}x{} grid ({} cells)",
            self.config.rows,
            self.config.cols,
            rects.len()
        );

        let mut bundle = ArchiveBundle::new();
        let mut slices = Vec::with_capacity(rects.len());

        for (index, rect) in rects.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let id = index as u32 + 1;
            let name = format!("{id:02}.png");

            let png = render_cell(&source, *rect, CELL_SPEC, &name)?;
            bundle.add_entry(&name, &png)?;
            slices.push(Slice { id, name, png });
        }

        // Covers derive from the top-left cell's rectangle, offsets included.
        // They go into the archive only, never into the preview numbering.
        if let Some(first) = rects.first() {
            tracing::debug!("Rendering covers from the first cell");

            let main = render_cell(&source, *first, MAIN_COVER_SPEC, MAIN_COVER_NAME)?;
            bundle.add_entry(MAIN_COVER_NAME, &main)?;

            let tab = render_cell(&source, *first, TAB_COVER_SPEC, TAB_COVER_NAME)?;
            bundle.add_entry(TAB_COVER_NAME, &tab)?;
        }

        tracing::info!("Packaging {} archive entries", bundle.entry_count());
        let archive = bundle.finalize()?;

        Ok(RunOutput { slices, archive })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use zip::ZipArchive;

    use super::*;

    fn png_source(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([120, 80, 40, 255]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn slicer(rows: u32, cols: u32) -> Slicer {
        Slicer::new(Config {
            rows,
            cols,
            ..Config::default()
        })
        .unwrap()
    }

    fn archive_names(archive: &[u8]) -> Vec<String> {
        let mut zip = ZipArchive::new(Cursor::new(archive.to_vec())).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_end_to_end_two_by_two() {
        let output = slicer(2, 2).process_bytes(&png_source(800, 600)).unwrap();

        assert_eq!(output.slices.len(), 4);
        for (i, slice) in output.slices.iter().enumerate() {
            assert_eq!(slice.id, i as u32 + 1);
        }

        // 400x300 cell fits 370x320 at 370x278 (width binds, 4:3 aspect).
        let first = load_image_from_bytes(&output.slices[0].png).unwrap();
        assert_eq!(first.dimensions(), (370, 278));

        // main.png is a fixed 240x240 pad with 240x180 content centered
        // at dy = 30.
        let mut zip = ZipArchive::new(Cursor::new(output.archive.clone())).unwrap();
        let mut main_bytes = Vec::new();
        std::io::Read::read_to_end(&mut zip.by_name("main.png").unwrap(), &mut main_bytes)
            .unwrap();
        let main = load_image_from_bytes(&main_bytes).unwrap();
        assert_eq!(main.dimensions(), (240, 240));
        assert_eq!(main.get_pixel(120, 29)[3], 0);
        assert!(main.get_pixel(120, 30)[3] > 0);
        assert!(main.get_pixel(120, 209)[3] > 0);
        assert_eq!(main.get_pixel(120, 210)[3], 0);
    }

    #[test]
    fn test_sequential_naming() {
        let output = slicer(2, 3).process_bytes(&png_source(300, 200)).unwrap();

        let names: Vec<&str> = output.slices.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["01.png", "02.png", "03.png", "04.png", "05.png", "06.png"]);
    }

    #[test]
    fn test_two_digit_padding_past_nine() {
        let output = slicer(3, 4).process_bytes(&png_source(400, 300)).unwrap();

        assert_eq!(output.slices[9].name, "10.png");
        assert_eq!(output.slices[11].name, "12.png");
    }

    #[test]
    fn test_archive_completeness_four_by_four() {
        let output = slicer(4, 4).process_bytes(&png_source(640, 640)).unwrap();

        let names = archive_names(&output.archive);
        assert_eq!(names.len(), 18);
        assert_eq!(names[0], "01.png");
        assert_eq!(names[15], "16.png");
        assert_eq!(names[16], "main.png");
        assert_eq!(names[17], "tab.png");
    }

    #[test]
    fn test_degenerate_grid_yields_empty_archive() {
        let output = slicer(0, 4).process_bytes(&png_source(200, 200)).unwrap();

        assert!(output.slices.is_empty());
        assert!(archive_names(&output.archive).is_empty());
    }

    #[test]
    fn test_tab_cover_dimensions() {
        let output = slicer(1, 1).process_bytes(&png_source(500, 500)).unwrap();

        let mut zip = ZipArchive::new(Cursor::new(output.archive)).unwrap();
        let mut tab_bytes = Vec::new();
        std::io::Read::read_to_end(&mut zip.by_name("tab.png").unwrap(), &mut tab_bytes)
            .unwrap();
        let tab = load_image_from_bytes(&tab_bytes).unwrap();
        assert_eq!(tab.dimensions(), (96, 74));
    }

    #[test]
    fn test_offsets_do_not_change_naming() {
        let mut with_offset = Slicer::new(Config {
            rows: 2,
            cols: 2,
            offset_x: 37.0,
            offset_y: -12.5,
            ..Config::default()
        })
        .unwrap();
        let output = with_offset.process_bytes(&png_source(200, 200)).unwrap();

        let names: Vec<&str> = output.slices.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["01.png", "02.png", "03.png", "04.png"]);
    }

    #[test]
    fn test_non_finite_offset_rejected() {
        let err = Slicer::new(Config {
            offset_x: f64::NAN,
            ..Config::default()
        })
        .unwrap_err();

        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_corrupt_source_aborts_run() {
        let err = slicer(2, 2).process_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, Error::ImageDecode { .. }));
    }

    #[test]
    fn test_slice_preview_is_revoked_on_drop() {
        let output = slicer(1, 1).process_bytes(&png_source(100, 100)).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = {
            let handle = output.slices[0].write_preview(dir.path()).unwrap();
            assert!(handle.path().exists());
            handle.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
