use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::Document;

use crate::{MergeSplitError, Result};

/// Serializes a PDF document to a file.
pub struct PdfWriter;

impl PdfWriter {
    /// Writes the given PDF [`Document`] to `path`.
    ///
    /// Missing parent directories are created first. The document is written
    /// through a buffered writer which is flushed before returning.
    ///
    /// # Errors
    ///
    /// Returns [`MergeSplitError::FailedToWrite`] if the directory or file
    /// cannot be created, or if serialization fails.
    pub fn write<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
        let path = path.as_ref();
        let to_write_error = |source| MergeSplitError::failed_to_write(path.to_path_buf(), source);

        OutputWriter::ensure_parent(path)?;

        let file = std::fs::File::create(path).map_err(to_write_error)?;
        let mut writer = BufWriter::new(file);

        doc.save_to(&mut writer)
            .map_err(|err| to_write_error(std::io::Error::other(err.to_string())))?;
        writer.flush().map_err(to_write_error)?;

        Ok(())
    }
}

/// Writes already-encoded output bytes (images) to disk.
pub struct OutputWriter;

impl OutputWriter {
    /// Write `bytes` to `path`, creating parent directories as needed.
    pub fn write_bytes<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
        let path = path.as_ref();
        Self::ensure_parent(path)?;
        std::fs::write(path, bytes)
            .map_err(|source| MergeSplitError::failed_to_write(path.to_path_buf(), source))
    }

    /// Create the directory `path` will live in.
    pub fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|source| MergeSplitError::failed_to_write(parent.to_path_buf(), source))?;
        }
        Ok(())
    }
}
