use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::errors::{ErrorCollector, ErrorRecord};
use super::events::EventSink;
use super::progress::ProgressReporter;
use super::{Job, OperationKind};
use crate::error::{MergeSplitError, Result};
use crate::render::PageRasterizer;

/// Everything an operation needs while it runs: the frozen job, its event
/// sink, error collector, progress reporter and cancellation token.
pub struct JobContext {
    job: Arc<Job>,
    events: EventSink,
    errors: ErrorCollector,
    progress: ProgressReporter,
    cancel: CancellationToken,
    rasterizer: Arc<dyn PageRasterizer>,
    outputs: Vec<PathBuf>,
}

impl JobContext {
    pub fn new(
        job: Job,
        events: EventSink,
        cancel: CancellationToken,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        let total = job.selection().len();
        Self {
            job: Arc::new(job),
            events,
            errors: ErrorCollector::new(),
            progress: ProgressReporter::new(total),
            cancel,
            rasterizer,
            outputs: Vec::new(),
        }
    }

    /// Shared handle to the job, so callers can borrow its inputs while
    /// mutating the context.
    pub fn job(&self) -> Arc<Job> {
        Arc::clone(&self.job)
    }

    pub fn kind(&self) -> OperationKind {
        self.job.kind()
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn rasterizer(&self) -> Arc<dyn PageRasterizer> {
        Arc::clone(&self.rasterizer)
    }

    /// Cooperative cancellation point.
    ///
    /// # Errors
    ///
    /// Returns [`MergeSplitError::Cancelled`] once cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(MergeSplitError::Cancelled);
        }
        Ok(())
    }

    /// Create the job's output directory and return it.
    pub async fn prepare_output_dir(&self) -> Result<PathBuf> {
        let dir = self.job.output_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| MergeSplitError::failed_to_write(dir.clone(), source))?;
        Ok(dir)
    }

    /// Set how many items the operation will process.
    pub fn start_progress(&mut self, total: usize) {
        self.progress.set_total(total);
    }

    /// Mark one item processed, emitting a progress event if the percentage
    /// moved.
    pub fn advance_progress(&mut self) {
        if let Some(percent) = self.progress.advance() {
            self.events.progress(percent);
        }
    }

    /// Record a per-item failure under this job's context label and log it.
    pub fn record_failure(&mut self, file: &Path, message: impl Display) {
        let context = self.job.kind().context_label();
        let record = self.errors.record(context, file, message.to_string());
        warn!(file = %record.file.display(), "{}", record.message);
        let line = format!("Failed: {} ({})", record.file_name(), record.message);
        self.events.error(line);
    }

    /// Note a file the job produced.
    pub fn commit_output(&mut self, path: PathBuf) {
        self.outputs.push(path);
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Take the outputs and error records accumulated so far.
    pub fn drain(&mut self) -> (Vec<PathBuf>, Vec<ErrorRecord>) {
        (std::mem::take(&mut self.outputs), self.errors.flush())
    }
}
