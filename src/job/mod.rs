//! Batch jobs: what to run, over which files, and where results go.
//!
//! A [`Job`] is built once when the controller accepts a [`JobRequest`] and
//! is never mutated afterwards. The operation reads it through its
//! [`JobContext`] together with the job's event sink, error collector,
//! progress reporter and cancellation token.

mod context;
mod controller;
mod errors;
mod events;
mod progress;

pub use context::JobContext;
pub use controller::{JobController, JobHandle, JobOutcome};
pub use errors::{ErrorCollector, ErrorRecord};
pub use events::{EventSink, JobEvent, LogLevel};
pub use progress::{ElapsedTicker, ProgressReporter, ProgressState, format_elapsed};

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{MergeSplitError, Result};

/// The four transformations a job can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Merge groups of files into one document each.
    Merge,
    /// Split one document into single-page documents.
    Split,
    /// Rasterize each page of one document to a size-bounded JPG.
    ConvertToImage,
    /// Compress one document with the external tool.
    Compress,
}

impl OperationKind {
    /// Folder under the output base holding this operation's results.
    pub fn result_folder(&self) -> &'static str {
        match self {
            Self::Merge => "Hasil_Gabung",
            Self::Split => "Hasil_Split",
            Self::ConvertToImage => "Hasil_PDF2JPG",
            Self::Compress => "Hasil_Kompres",
        }
    }

    /// Label attached to error records raised by this operation.
    pub fn context_label(&self) -> &'static str {
        match self {
            Self::Merge => "Merge PDF",
            Self::Split => "Split PDF",
            Self::ConvertToImage => "Convert PDF to JPG",
            Self::Compress => "Compress PDF",
        }
    }

    /// Whether outputs are nested under the source folder's name.
    pub fn nests_source_folder(&self) -> bool {
        matches!(self, Self::Merge | Self::Split)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Merge => "Merge",
            Self::Split => "Split",
            Self::ConvertToImage => "Conversion",
            Self::Compress => "Compression",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The operation is executing.
    Running,
    /// A cancellation request was observed at a checkpoint.
    Cancelled,
    /// The operation ran out of input.
    Completed,
}

/// The files a job runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Explicitly chosen files, in the order given.
    Files(Vec<PathBuf>),
    /// Every PDF in a folder. Merge groups these by name prefix.
    Folder {
        /// The folder the files were listed from.
        folder: PathBuf,
        /// PDF files found in the folder.
        files: Vec<PathBuf>,
    },
}

impl Selection {
    /// All selected files.
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::Files(files) => files,
            Self::Folder { files, .. } => files,
        }
    }

    /// Number of selected files.
    pub fn len(&self) -> usize {
        self.files().len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }

    /// Whether this is a folder-mode selection.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }

    /// Name of the folder the inputs came from: the selected folder itself,
    /// or the parent directory of the first file.
    pub fn source_folder_name(&self) -> Option<String> {
        let folder = match self {
            Self::Folder { folder, .. } => Some(folder.as_path()),
            Self::Files(files) => files.first().and_then(|f| f.parent()),
        };
        folder
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// A request to run one operation over a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Operation to run.
    pub kind: OperationKind,
    /// Input files.
    pub selection: Selection,
}

impl JobRequest {
    /// Create a request.
    pub fn new(kind: OperationKind, selection: Selection) -> Self {
        Self { kind, selection }
    }

    /// Check the selection satisfies the operation's cardinality rule.
    ///
    /// Merge needs at least one file, and at least two when the files were
    /// chosen explicitly. Every other operation needs exactly one file.
    ///
    /// # Errors
    ///
    /// Returns [`MergeSplitError::InputRequired`] or
    /// [`MergeSplitError::InsufficientInput`].
    pub fn validate(&self) -> Result<()> {
        if self.selection.is_empty() {
            return Err(MergeSplitError::input_required(
                "select a PDF file or a folder first",
            ));
        }

        match self.kind {
            OperationKind::Merge => {
                if !self.selection.is_folder() && self.selection.len() < 2 {
                    return Err(MergeSplitError::InsufficientInput {
                        required: 2,
                        provided: self.selection.len(),
                    });
                }
            }
            OperationKind::Split | OperationKind::ConvertToImage | OperationKind::Compress => {
                if self.selection.len() != 1 {
                    return Err(MergeSplitError::input_required(format!(
                        "{} works on exactly one PDF file, got {}",
                        self.kind.context_label(),
                        self.selection.len()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// An accepted request, frozen with the settings and start time it runs under.
#[derive(Debug, Clone)]
pub struct Job {
    kind: OperationKind,
    selection: Selection,
    settings: Settings,
    started_at: DateTime<Local>,
}

impl Job {
    /// Freeze a validated request.
    pub fn new(request: JobRequest, settings: Settings, started_at: DateTime<Local>) -> Self {
        Self {
            kind: request.kind,
            selection: request.selection,
            settings,
            started_at,
        }
    }

    /// Operation kind.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Input selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// First selected file. Validation guarantees one exists.
    pub fn primary_input(&self) -> Option<&Path> {
        self.selection.files().first().map(PathBuf::as_path)
    }

    /// Settings snapshot.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// When the job started.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Directory this job writes into:
    /// `<base>/<result folder>/<yyyy-mm-dd>/<source folder name>`.
    pub fn output_dir(&self) -> PathBuf {
        let source_folder = if self.kind.nests_source_folder() {
            self.selection.source_folder_name()
        } else {
            None
        };
        output_dir(
            &self.settings.output_base,
            self.kind,
            &self.started_at.format("%Y-%m-%d").to_string(),
            source_folder.as_deref(),
        )
    }
}

/// Compute an operation's output directory for a given date.
pub fn output_dir(
    base: &Path,
    kind: OperationKind,
    iso_date: &str,
    source_folder: Option<&str>,
) -> PathBuf {
    let mut dir = base.join(kind.result_folder()).join(iso_date);
    if let Some(name) = source_folder
        && !name.is_empty()
    {
        dir.push(name);
    }
    dir
}
