//! Accepting requests and driving jobs to completion.
//!
//! At most one job runs per controller. [`JobController::start`] validates
//! the request, freezes it into a [`Job`], and spawns the operation on the
//! tokio runtime. The returned [`JobHandle`] carries the event stream and the
//! cancellation switch.
//!
//! Every job ends the same way: the ticker stops, a "Total time" line and a
//! terminal line are logged, the error report is emitted, and finally a
//! [`JobEvent::Finished`] event closes the stream.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

use super::context::JobContext;
use super::errors::ErrorRecord;
use super::events::{EventSink, JobEvent};
use super::progress::ElapsedTicker;
use super::{Job, JobRequest, JobStatus, OperationKind};
use crate::config::Settings;
use crate::error::{MergeSplitError, Result};
use crate::ops;
use crate::render::{GhostscriptRasterizer, PageRasterizer};

/// How often elapsed time is reported.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// What a finished job produced.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub kind: OperationKind,
    pub status: JobStatus,
    /// Per-item failures, in the order they happened.
    pub errors: Vec<ErrorRecord>,
    /// Files written.
    pub outputs: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl JobOutcome {
    /// Whether any item failed.
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == JobStatus::Cancelled
    }
}

/// Starts jobs, one at a time.
pub struct JobController {
    settings: Settings,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
    active: Arc<AtomicBool>,
}

impl JobController {
    /// Create a controller. Pages are rasterized with Ghostscript at the
    /// settings' tool location.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            rasterizer: None,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use a different rasterizer for conversion jobs.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings used by subsequent jobs.
    ///
    /// # Errors
    ///
    /// Fails with [`MergeSplitError::JobAlreadyRunning`] while a job is active,
    /// or [`MergeSplitError::InvalidConfig`] if the settings are invalid.
    pub fn set_settings(&mut self, settings: Settings) -> Result<()> {
        if self.is_busy() {
            return Err(MergeSplitError::JobAlreadyRunning);
        }
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Whether a job is currently running.
    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Validate `request` and start running it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the request's validation error, or
    /// [`MergeSplitError::JobAlreadyRunning`] if another job is active. No job
    /// is created in either case.
    pub fn start(&self, request: JobRequest) -> Result<JobHandle> {
        request.validate()?;
        let guard = ActiveGuard::acquire(&self.active)?;

        let job = Job::new(request, self.settings.clone(), Local::now());
        let kind = job.kind();

        let (tx, rx) = mpsc::unbounded_channel();
        let events = EventSink::new(tx);
        let cancel = CancellationToken::new();
        let rasterizer = self.rasterizer.clone().unwrap_or_else(|| {
            Arc::new(GhostscriptRasterizer::new(self.settings.resolved_tool()))
        });

        let ctx = JobContext::new(job, events.clone(), cancel.clone(), rasterizer);
        let span = info_span!("job", kind = %kind);
        let task = tokio::spawn(execute(ctx, events, guard).instrument(span));

        Ok(JobHandle {
            kind,
            cancel,
            events: rx,
            task,
        })
    }
}

/// Observer side of a running job.
#[derive(Debug)]
pub struct JobHandle {
    kind: OperationKind,
    cancel: CancellationToken,
    events: UnboundedReceiver<JobEvent>,
    task: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Request cancellation. The job stops at its next checkpoint; a running
    /// tool process is killed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this job, for handing to other tasks.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next event, or `None` once the job is gone and the stream is drained.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Wait for the job to finish. Events not yet received are dropped.
    pub async fn wait(self) -> Result<JobOutcome> {
        self.task
            .await
            .map_err(|err| MergeSplitError::other(format!("job task failed: {err}")))
    }

    /// Collect every event up to and including `Finished`, then the outcome.
    pub async fn run_to_end(mut self) -> Result<(Vec<JobEvent>, JobOutcome)> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            let finished = event.is_finished();
            events.push(event);
            if finished {
                break;
            }
        }
        let outcome = self.wait().await?;
        Ok((events, outcome))
    }
}

/// Holds the controller's busy flag for the lifetime of one job.
struct ActiveGuard(Arc<AtomicBool>);

impl ActiveGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MergeSplitError::JobAlreadyRunning)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn execute(mut ctx: JobContext, events: EventSink, guard: ActiveGuard) -> JobOutcome {
    let job = ctx.job();
    let kind = job.kind();
    let inputs = job.selection().len();

    info!(inputs, "Job started");
    events.send(JobEvent::Started { kind, inputs });
    let ticker = ElapsedTicker::start(events.clone(), TICK_INTERVAL);

    let status = match ops::run(&mut ctx).await {
        Ok(()) => JobStatus::Completed,
        Err(err) if err.is_cancelled() => JobStatus::Cancelled,
        Err(err) => {
            error!("Job aborted: {}", err);
            let file = job.primary_input().unwrap_or_else(|| Path::new(""));
            ctx.record_failure(file, &err);
            JobStatus::Completed
        }
    };

    let elapsed = ticker.stop().await;
    events.total_time(elapsed);

    let failures = ctx.error_count();
    match status {
        JobStatus::Cancelled => events.warning(format!("{kind} cancelled.")),
        _ if failures > 0 => {
            events.warning(format!("{kind} finished with {failures} error(s)."))
        }
        _ => events.success(format!("{kind} finished.")),
    }

    let (outputs, errors) = ctx.drain();
    events.send(JobEvent::ErrorReport {
        records: errors.clone(),
    });
    info!(
        ?status,
        errors = errors.len(),
        outputs = outputs.len(),
        "Job finished"
    );

    // Free the controller before observers learn the job is over.
    drop(guard);
    events.send(JobEvent::Finished { status, elapsed });

    JobOutcome {
        kind,
        status,
        errors,
        outputs,
        elapsed,
    }
}
