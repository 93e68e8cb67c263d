//! Ephemeral preview files with scoped release.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A rendered buffer written out for display and removed again on drop.
///
/// The archive never depends on preview lifetime: handles are created from
/// already-encoded slice buffers and revoking one (dropping it) only
/// deletes the preview file.
#[derive(Debug)]
pub struct PreviewHandle {
    path: PathBuf,
}

impl PreviewHandle {
    /// Write `bytes` to `dir/name` and return a handle owning the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn create(dir: &Path, name: &str, bytes: &[u8]) -> Result<Self> {
        let path = dir.join(name);
        fs::write(&path, bytes)?;

        Ok(Self { path })
    }

    /// Path to the preview file, valid while the handle lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        // Revocation is best-effort; a missing file is not an error.
        let _ = fs::remove_file(&self.path);
    }
}
