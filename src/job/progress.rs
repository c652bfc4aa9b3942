//! Progress tracking and the elapsed-time ticker.

use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::events::EventSink;

/// Snapshot of a reporter's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

/// Turns completed-item counts into integer percentages.
///
/// Percent is `completed * 100 / total`, rounded down and capped at 100. It
/// never goes backwards, and [`advance`](Self::advance) only yields a value
/// when it changed.
#[derive(Debug)]
pub struct ProgressReporter {
    total: usize,
    completed: usize,
    last_percent: Option<u8>,
}

impl ProgressReporter {
    /// Create a reporter for `total` items.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            last_percent: None,
        }
    }

    /// Reset the item total once it is known. Completed items are kept and
    /// the percentage still never drops.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    /// Mark one more item done. Returns the new percentage if it changed.
    pub fn advance(&mut self) -> Option<u8> {
        self.completed = self.completed.saturating_add(1);
        let percent = self.compute().max(self.last_percent.unwrap_or(0));

        if self.last_percent == Some(percent) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(percent)
    }

    /// Current percentage.
    pub fn percent(&self) -> u8 {
        self.last_percent.unwrap_or(0)
    }

    pub fn state(&self) -> ProgressState {
        ProgressState {
            completed: self.completed,
            total: self.total,
            percent: self.percent(),
        }
    }

    fn compute(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = self.completed.saturating_mul(100) / self.total;
        percent.min(100) as u8
    }
}

/// Periodically reports elapsed time on an [`EventSink`].
///
/// The background task is aborted by [`stop`](Self::stop) or on drop, so a
/// ticker never outlives its job.
#[derive(Debug)]
pub struct ElapsedTicker {
    started: Instant,
    handle: Option<JoinHandle<()>>,
}

impl ElapsedTicker {
    /// Start ticking every `period`. Must be called inside a tokio runtime.
    pub fn start(events: EventSink, period: Duration) -> Self {
        let started = Instant::now();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                events.elapsed(started.elapsed());
            }
        });

        Self {
            started,
            handle: Some(handle),
        }
    }

    /// Time since the ticker started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop ticking and return the total elapsed time.
    ///
    /// Waits for the task to wind down, so no tick is emitted after this
    /// returns.
    pub async fn stop(mut self) -> Duration {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.started.elapsed()
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Format a duration as `Xm Ys`.
pub fn format_elapsed(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}
