//! Error types for mergesplit.
//!
//! Errors fall into three groups: precondition errors raised before a job
//! starts, per-item errors that an operation records and skips past, and
//! fatal errors that end an operation early. Only precondition errors ever
//! reach the caller of [`JobController::start`](crate::job::JobController::start);
//! everything raised inside a running job is funneled into its error report.

use std::io;
use std::path::PathBuf;

/// Result type alias for mergesplit operations.
pub type Result<T> = std::result::Result<T, MergeSplitError>;

/// Main error type for mergesplit.
#[derive(Debug, thiserror::Error)]
pub enum MergeSplitError {
    /// The selection is empty or has the wrong number of files for the operation.
    #[error("Input required: {message}")]
    InputRequired {
        /// What the operation expected.
        message: String,
    },

    /// An explicit merge selection contains fewer files than a merge needs.
    #[error("At least {required} files are required to merge, got {provided}")]
    InsufficientInput {
        /// Minimum number of files.
        required: usize,
        /// Number of files selected.
        provided: usize,
    },

    /// A job is already running on this controller.
    #[error("Another job is already running")]
    JobAlreadyRunning,

    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Input path exists but is not a regular file.
    #[error("Not a file: {}", path.display())]
    NotAFile {
        /// Offending path.
        path: PathBuf,
    },

    /// Failed to load a PDF document.
    #[error("Failed to load PDF: {}\n  Reason: {reason}", path.display())]
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Requested page does not exist in the document.
    #[error("Page {page} out of range for {} ({total} page(s))", path.display())]
    PageOutOfRange {
        /// Path to the PDF file.
        path: PathBuf,
        /// Requested 1-indexed page.
        page: u32,
        /// Total pages in the document.
        total: u32,
    },

    /// Failed to write an output file.
    #[error("Failed to write output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A page could not be rasterized.
    #[error("Failed to render page {page}: {reason}")]
    RenderFailed {
        /// 1-indexed page number.
        page: u32,
        /// Underlying reason.
        reason: String,
    },

    /// Image encoding failed.
    #[error("Failed to encode image: {reason}")]
    EncodeFailed {
        /// Underlying reason.
        reason: String,
    },

    /// The external tool could not be started.
    #[error("Failed to launch {}: {source}", tool.display())]
    ToolLaunchFailed {
        /// Tool binary that failed to start.
        tool: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong.
        message: String,
    },

    /// The running job observed a cancellation request.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reported by the PDF library.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Error reported by the image library.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl MergeSplitError {
    /// Create an InputRequired error.
    pub fn input_required(message: impl Into<String>) -> Self {
        Self::InputRequired {
            message: message.into(),
        }
    }

    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path,
            reason: reason.into(),
        }
    }

    /// Create a FailedToWrite error.
    pub fn failed_to_write(path: PathBuf, source: io::Error) -> Self {
        Self::FailedToWrite { path, source }
    }

    /// Create a RenderFailed error.
    pub fn render_failed(page: u32, reason: impl Into<String>) -> Self {
        Self::RenderFailed {
            page,
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// True for the cooperative stop signal raised at a cancellation checkpoint.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True for errors rejected before a job is created.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InputRequired { .. } | Self::InsufficientInput { .. } | Self::JobAlreadyRunning
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputRequired { .. } => 1,
            Self::InsufficientInput { .. } => 1,
            Self::JobAlreadyRunning => 1,
            Self::InvalidConfig { .. } => 1,
            Self::FileNotFound { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::FailedToLoadPdf { .. } => 3,
            Self::PageOutOfRange { .. } => 3,
            Self::Pdf(_) => 3,
            Self::FailedToWrite { .. } => 5,
            Self::Io(_) => 5,
            Self::RenderFailed { .. } => 6,
            Self::EncodeFailed { .. } => 6,
            Self::Image(_) => 6,
            Self::ToolLaunchFailed { .. } => 6,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Other { .. } => 1,
        }
    }
}
