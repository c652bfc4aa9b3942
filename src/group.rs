//! Partitioning a folder's files into logical documents.
//!
//! A file's group key is the part of its extension-stripped name before the
//! first `_`, or the whole stem when there is no `_`. So `A_1.pdf` and
//! `A_2.pdf` belong to group `A`, while `B.pdf` is group `B` on its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One output document's worth of input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    /// Group key, used as the output file stem.
    pub key: String,
    /// Member files, sorted by file name.
    pub members: Vec<PathBuf>,
}

/// Derive the group key for a single file.
pub fn group_key(path: &Path) -> String {
    let stem = file_stem(path);
    match stem.split_once('_') {
        Some((prefix, _)) => prefix.to_string(),
        None => stem,
    }
}

/// Partition `files` into groups ordered by key, each with members sorted by
/// file name. Every input lands in exactly one group.
pub fn group_files(files: &[PathBuf]) -> Vec<FileGroup> {
    let mut grouped: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for file in files {
        grouped.entry(group_key(file)).or_default().push(file.clone());
    }

    grouped
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            FileGroup { key, members }
        })
        .collect()
}

/// File name without its final extension, lossily converted to UTF-8.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
