use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{blocking, display_name};
use crate::document::DocumentMerger;
use crate::error::Result;
use crate::group::{file_stem, group_files};
use crate::io::{PdfReader, PdfWriter};
use crate::job::{JobContext, Selection};

/// Merge the job's inputs.
///
/// Folder selections are grouped by name prefix and produce one document per
/// group, advancing progress per group. Explicit selections form a single
/// group named after the first file and advance progress per source.
pub async fn run(ctx: &mut JobContext) -> Result<()> {
    let job = ctx.job();
    let out_dir = ctx.prepare_output_dir().await?;

    match job.selection() {
        Selection::Folder { files, .. } => {
            let groups = group_files(files);
            info!(groups = groups.len(), files = files.len(), "Merging folder");
            ctx.start_progress(groups.len());

            for group in groups {
                ctx.checkpoint()?;
                let sources = collect_sources(ctx, &group.members, false).await?;
                let destination = out_dir.join(format!("{}.pdf", group.key));
                finalize(ctx, &group.members, sources, destination).await;
                ctx.advance_progress();
            }
        }
        Selection::Files(files) => {
            info!(files = files.len(), "Merging selection");
            ctx.start_progress(files.len());

            let sources = collect_sources(ctx, files, true).await?;
            let stem = files.first().map(|f| file_stem(f)).unwrap_or_default();
            let destination = out_dir.join(format!("{stem}.pdf"));
            finalize(ctx, files, sources, destination).await;
        }
    }

    Ok(())
}

/// Load each member in order. Members that fail to load are recorded and
/// skipped. Returns early with `Cancelled` if cancellation is requested,
/// dropping whatever was collected.
async fn collect_sources(
    ctx: &mut JobContext,
    members: &[PathBuf],
    tick_per_source: bool,
) -> Result<Vec<Document>> {
    let mut sources = Vec::with_capacity(members.len());

    for member in members {
        ctx.checkpoint()?;

        let path = member.clone();
        match blocking(move || PdfReader::read(&path)).await {
            Ok(doc) => {
                debug!(file = %member.display(), pages = doc.get_pages().len(), "Source loaded");
                ctx.events().info(format!("Merging: {}", display_name(member)));
                sources.push(doc);
            }
            Err(err) => ctx.record_failure(member, &err),
        }

        if tick_per_source {
            ctx.advance_progress();
        }
    }

    Ok(sources)
}

/// Write the merged document for one group. Failures are recorded, never
/// returned, so the next group still runs.
async fn finalize(
    ctx: &mut JobContext,
    members: &[PathBuf],
    sources: Vec<Document>,
    destination: PathBuf,
) {
    if sources.is_empty() {
        let file = members.first().map(PathBuf::as_path).unwrap_or(Path::new(""));
        ctx.record_failure(file, "no source in this group could be loaded");
        return;
    }

    let target = destination.clone();
    let result = blocking(move || {
        let mut merged = DocumentMerger::merge(sources)?;
        PdfWriter::write(&mut merged, &target)
    })
    .await;

    match result {
        Ok(()) => {
            info!(output = %destination.display(), "Merged document written");
            ctx.events()
                .success(format!("Finished: {}", display_name(&destination)));
            ctx.commit_output(destination);
        }
        Err(err) => ctx.record_failure(&destination, &err),
    }
}
