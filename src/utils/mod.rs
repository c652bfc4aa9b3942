//! Utilities for turning command-line selections into input file lists.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{MergeSplitError, Result};

/// Expand multiple glob patterns into filesystem paths.
///
/// Accepts anything iterable with items that convert to `&str`, e.g.:
/// `&[&str]`, `Vec<String>`, or `Vec<&str>`. Patterns that match nothing
/// are kept verbatim so the job reports the missing file. Matches that are
/// not regular files are skipped.
///
/// Errors:
/// - Propagates `glob` parse errors.
/// - Propagates filesystem errors from glob iterator.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns.into_iter() {
        let paths = collect_paths_for_pattern(pattern.as_ref())?;
        if paths.is_empty() {
            resolved_paths.push(PathBuf::from(pattern.as_ref()));
        } else {
            resolved_paths.extend(paths);
        }
    }

    Ok(resolved_paths)
}

/// Expand a single glob pattern into filesystem paths.
///
/// Pattern examples:
/// - `"scans/*.pdf"`
/// - `"./batch_??.pdf"`
fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut resolved_paths = Vec::new();

    let paths = glob::glob(pattern).map_err(|err| MergeSplitError::Other {
        message: format!("Invalid pattern '{pattern}': {err}"),
    })?;

    for entry in paths {
        let path = entry.map_err(|err| MergeSplitError::Other {
            message: err.to_string(),
        })?;
        // Directories matched by a wildcard are not inputs
        if path.is_file() {
            resolved_paths.push(path);
        }
    }

    Ok(resolved_paths)
}

/// PDF files directly inside `folder`, sorted by file name.
///
/// # Errors
///
/// Fails if `folder` is missing, not a directory, or cannot be listed.
pub fn list_folder_pdfs(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.try_exists()? {
        return Err(MergeSplitError::file_not_found(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(MergeSplitError::input_required(format!(
            "{} is not a folder",
            folder.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| MergeSplitError::Other {
            message: err.to_string(),
        })?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Keep only paths with a `.pdf` extension, in their original order.
pub fn filter_pdfs(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.into_iter().filter(|p| is_pdf(p)).collect()
}

/// Whether `path` has a `.pdf` extension, ignoring case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
