//! Model downloading and loading utilities.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use ort::session::Session;

use crate::error::{Error, Result};

/// Types of models used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// U²-Net salient-object segmentation, used for background matting.
    U2Net,
}

impl ModelType {
    /// Get the filename for this model type.
    #[must_use]
    pub const fn filename(&self) -> &'static str {
        match self {
            Self::U2Net => "u2net.onnx",
        }
    }

    /// Get the download URL for this model type.
    /// Using the rembg project's ONNX export of U²-Net (publicly available).
    #[must_use]
    pub const fn url(&self) -> &'static str {
        match self {
            Self::U2Net => {
                "https://github.com/danielgatis/rembg/releases/download/v0.0.0/u2net.onnx"
            }
        }
    }

    /// Get the approximate size in bytes for progress indication.
    #[must_use]
    pub const fn approx_size(&self) -> u64 {
        match self {
            Self::U2Net => 176_000_000, // ~176 MB
        }
    }
}

/// Manages the model cache directory and downloads.
pub struct ModelCache {
    cache_dir: PathBuf,
}

impl ModelCache {
    /// Create a new model cache.
    ///
    /// Uses the platform-appropriate cache directory:
    /// - Windows: `%LOCALAPPDATA%\stickerslicer\models`
    /// - Linux: `~/.cache/stickerslicer/models`
    /// - macOS: `~/Library/Caches/stickerslicer/models`
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created.
    pub fn new() -> Result<Self> {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        let cache_dir = base.join("stickerslicer").join("models");

        fs::create_dir_all(&cache_dir).map_err(|source| Error::CacheDir {
            path: cache_dir.clone(),
            source,
        })?;

        Ok(Self { cache_dir })
    }

    /// Get the path to a model file, downloading if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be downloaded or accessed.
    pub fn get_model_path(&self, model_type: ModelType) -> Result<PathBuf> {
        let path = self.cache_dir.join(model_type.filename());

        if !path.exists() {
            download_model(model_type, &path)?;
        }

        Ok(path)
    }

    /// Load an ONNX model session.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded.
    pub fn load_session(&self, model_type: ModelType) -> Result<Session> {
        let path = self.get_model_path(model_type)?;

        Session::builder()
            .map_err(|source| Error::ModelLoad {
                name: model_type.filename().to_string(),
                source,
            })?
            .commit_from_file(&path)
            .map_err(|source| Error::ModelLoad {
                name: model_type.filename().to_string(),
                source,
            })
    }
}

/// Download a model to the specified path.
fn download_model(model_type: ModelType, path: &Path) -> Result<()> {
    download_file(
        model_type.url(),
        path,
        model_type.filename(),
        model_type.approx_size(),
    )
}

/// Download a file from a URL to a path with progress indication.
fn download_file(url: &str, path: &Path, name: &str, approx_size: u64) -> Result<()> {
    tracing::info!("Downloading {name} from {url}");

    let client = reqwest::blocking::Client::new();
    let response = client.get(url).send().map_err(|source| Error::ModelDownload {
        name: name.to_string(),
        source,
    })?;

    let total_size = response.content_length().unwrap_or(approx_size);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Downloading {name}"));

    // Write to a temporary file first, then rename for atomicity
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;

    let mut downloaded = 0u64;
    let mut reader = response;

    loop {
        let mut buffer = [0u8; 8192];
        let bytes_read = std::io::Read::read(&mut reader, &mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }

    pb.finish_with_message(format!("Downloaded {name}"));

    // Atomic rename
    fs::rename(&temp_path, path)?;

    Ok(())
}
