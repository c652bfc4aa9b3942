use tracing::info;

use super::display_name;
use crate::error::{MergeSplitError, Result};
use crate::group::file_stem;
use crate::io::PdfReader;
use crate::job::JobContext;
use crate::tool::{CompressionRequest, ExternalToolRunner, ToolExit};

/// Compress the job's single input with the external tool into
/// `<stem>_compressed.pdf`.
///
/// Tool output is relayed line by line. A non-zero exit is recorded as a
/// failure. On success the result's size is compared against the configured
/// ceiling; exceeding it only produces a warning.
pub async fn run(ctx: &mut JobContext) -> Result<()> {
    let job = ctx.job();
    let settings = job.settings();
    let source = job
        .primary_input()
        .ok_or_else(|| MergeSplitError::input_required("no file to compress"))?
        .to_path_buf();
    PdfReader::check_path_exists(&source)?;

    let out_dir = ctx.prepare_output_dir().await?;
    let destination = out_dir.join(format!("{}_compressed.pdf", file_stem(&source)));
    let request = CompressionRequest::new(
        &source,
        &destination,
        settings.profile,
        settings.resolved_tool(),
    );

    info!(
        file = %source.display(),
        profile = %request.profile(),
        tool = %request.tool().display(),
        "Compressing document"
    );
    ctx.start_progress(1);
    ctx.events().info(format!(
        "Compressing: {} ({})",
        display_name(&source),
        request.profile()
    ));

    let cancel = ctx.cancel_token();
    let events = ctx.events().clone();
    let exit = ExternalToolRunner::run(request.tool(), &request.args(), &cancel, |line| {
        events.info(format!("GS: {line}"))
    })
    .await?;

    match exit {
        ToolExit::Killed => return Err(MergeSplitError::Cancelled),
        ToolExit::Exited(0) => report_size(ctx, &request, settings.max_pdf_bytes()).await,
        ToolExit::Exited(code) => ctx.record_failure(&source, format!("Exit code: {code}")),
    }

    ctx.advance_progress();
    Ok(())
}

async fn report_size(ctx: &mut JobContext, request: &CompressionRequest, ceiling: u64) {
    let destination = request.destination();
    let size = match tokio::fs::metadata(destination).await {
        Ok(meta) => meta.len(),
        Err(err) => {
            ctx.record_failure(
                request.source(),
                format!("compressed file not found: {err}"),
            );
            return;
        }
    };

    let name = display_name(destination);
    // Rounded up, so anything over the ceiling also reads as over it
    let size_kb = size.div_ceil(1024);
    if size > ceiling {
        ctx.events().warning(format!(
            "Compressed: {name} ({size_kb} KB, target {} KB)",
            ceiling / 1024
        ));
    } else {
        ctx.events()
            .success(format!("Compressed: {name} ({size_kb} KB)"));
    }
    ctx.commit_output(destination.to_path_buf());
}
