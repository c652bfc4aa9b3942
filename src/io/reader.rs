use lopdf::Document;
use std::path::Path;

use crate::{MergeSplitError, Result};

/// Loads PDF documents, checking the path up front so a missing file and a
/// malformed one produce distinct errors.
pub struct PdfReader;

impl PdfReader {
    /// Load the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeSplitError::FileNotFound`] or [`MergeSplitError::NotAFile`]
    /// for bad paths and [`MergeSplitError::FailedToLoadPdf`] when parsing fails
    /// or the document has no pages.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Document> {
        let path = path.as_ref();
        Self::check_path_exists(path)?;

        let doc = Document::load(path)
            .map_err(|err| MergeSplitError::failed_to_load_pdf(path.to_path_buf(), err.to_string()))?;

        if doc.get_pages().is_empty() {
            return Err(MergeSplitError::failed_to_load_pdf(
                path.to_path_buf(),
                "PDF has no pages",
            ));
        }

        Ok(doc)
    }

    /// Ensure `path` exists and is a regular file.
    pub fn check_path_exists<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let exists = path.try_exists()?;
        if !exists {
            return Err(MergeSplitError::file_not_found(path.to_path_buf()));
        }

        if path.is_dir() {
            return Err(MergeSplitError::not_a_file(path.to_path_buf()));
        }

        Ok(())
    }

    /// Number of pages in a loaded document.
    pub fn page_count(doc: &Document) -> u32 {
        doc.get_pages().len() as u32
    }
}
