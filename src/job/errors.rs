//! Per-item failures collected over a job's run.

use serde::Serialize;
use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// What was being done, e.g. "Split PDF".
    pub context: String,
    /// The file involved.
    pub file: PathBuf,
    /// Failure description.
    pub message: String,
}

impl ErrorRecord {
    /// Base name of the file, or the whole path if it has none.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string())
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> File: {} -> {}",
            self.context,
            self.file_name(),
            self.message
        )
    }
}

/// Accumulates [`ErrorRecord`]s in the order they happen.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    records: Vec<ErrorRecord>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return it.
    pub fn record(
        &mut self,
        context: impl Into<String>,
        file: &Path,
        message: impl Into<String>,
    ) -> &ErrorRecord {
        self.records.push(ErrorRecord {
            context: context.into(),
            file: file.to_path_buf(),
            message: message.into(),
        });
        let last = self.records.len() - 1;
        &self.records[last]
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hand back everything recorded so far and start empty again.
    pub fn flush(&mut self) -> Vec<ErrorRecord> {
        mem::take(&mut self.records)
    }
}
