//! Events a running job emits to its observer.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use super::errors::ErrorRecord;
use super::progress::format_elapsed;
use super::{JobStatus, OperationKind};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Everything an observer sees of a job, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    /// The job was accepted and is running.
    Started { kind: OperationKind, inputs: usize },
    /// A user-facing log line.
    Log { level: LogLevel, message: String },
    /// Progress as an integer percentage. Never decreases within a job.
    Progress { percent: u8 },
    /// Elapsed time since start, sent about once a second.
    Elapsed {
        #[serde(with = "duration_secs")]
        elapsed: Duration,
    },
    /// Errors recorded over the job's run, sent once at the end.
    ErrorReport { records: Vec<ErrorRecord> },
    /// Terminal event. Nothing follows it.
    Finished {
        status: JobStatus,
        #[serde(with = "duration_secs")]
        elapsed: Duration,
    },
}

impl JobEvent {
    /// Whether this is the terminal event.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// The message of a log event.
    pub fn log_message(&self) -> Option<&str> {
        match self {
            Self::Log { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Sending half of a job's event channel.
///
/// Sends never fail: if the observer dropped its receiver the event is
/// discarded and the job carries on.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<JobEvent>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<JobEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: JobEvent) {
        let _ = self.tx.send(event);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.send(JobEvent::Log {
            level,
            message: message.into(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn progress(&self, percent: u8) {
        self.send(JobEvent::Progress { percent });
    }

    pub fn elapsed(&self, elapsed: Duration) {
        self.send(JobEvent::Elapsed { elapsed });
    }

    /// Log the closing "Total time" line.
    pub fn total_time(&self, elapsed: Duration) {
        self.info(format!("Total time: {}", format_elapsed(elapsed)));
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
