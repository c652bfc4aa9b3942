//! The four operations a job can run.
//!
//! Each operation walks its items one at a time, checking for cancellation
//! before every item. A failing item is recorded in the job's error collector
//! and the operation moves on. Only failures that make the whole job
//! impossible (the single input cannot be read, the output directory cannot
//! be created, the tool cannot be launched) are returned as errors.
//!
//! PDF parsing, page surgery, rendering and encoding are blocking, so they run
//! on tokio's blocking pool via [`blocking`].

mod compress;
mod convert;
mod merge;
mod split;

use crate::error::{MergeSplitError, Result};
use crate::job::{JobContext, OperationKind};

/// Run the operation the context's job asks for.
pub async fn run(ctx: &mut JobContext) -> Result<()> {
    match ctx.kind() {
        OperationKind::Merge => merge::run(ctx).await,
        OperationKind::Split => split::run(ctx).await,
        OperationKind::ConvertToImage => convert::run(ctx).await,
        OperationKind::Compress => compress::run(ctx).await,
    }
}

/// Run blocking work off the async workers.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| MergeSplitError::other(format!("worker task failed: {err}")))?
}

/// Display name of a path for log lines.
fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
