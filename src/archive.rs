//! In-memory ZIP packaging of rendered buffers.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{Error, Result};

/// Accumulates named PNG buffers and finalizes them into a single
/// downloadable ZIP.
///
/// Entries are written in insertion order and never rewritten; the bundle
/// is append-only until [`finalize`](Self::finalize) consumes it.
pub struct ArchiveBundle {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ArchiveBundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options,
            entries: 0,
        }
    }

    /// Append one named buffer as an archive entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    pub fn add_entry(&mut self, name: &str, buffer: &[u8]) -> Result<()> {
        self.writer
            .start_file(name, self.options)
            .map_err(|source| Error::Archive {
                name: name.to_string(),
                source,
            })?;
        self.writer.write_all(buffer)?;
        self.entries += 1;

        Ok(())
    }

    /// Number of entries added so far.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Write the central directory and return the finished ZIP bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be finalized.
    pub fn finalize(self) -> Result<Vec<u8>> {
        let cursor = self.writer.finish().map_err(|source| Error::Archive {
            name: "central directory".to_string(),
            source,
        })?;

        Ok(cursor.into_inner())
    }
}

impl Default for ArchiveBundle {
    fn default() -> Self {
        Self::new()
    }
}
