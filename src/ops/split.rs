use std::sync::Arc;
use tracing::info;

use super::{blocking, display_name};
use crate::document::PageExtractor;
use crate::error::{MergeSplitError, Result};
use crate::group::file_stem;
use crate::io::{PdfReader, PdfWriter};
use crate::job::JobContext;

/// Split the job's single input into `<stem>_<n>.pdf`, one file per page.
pub async fn run(ctx: &mut JobContext) -> Result<()> {
    let job = ctx.job();
    let source = job
        .primary_input()
        .ok_or_else(|| MergeSplitError::input_required("no file to split"))?
        .to_path_buf();

    let path = source.clone();
    let doc = Arc::new(blocking(move || PdfReader::read(&path)).await?);
    let total = PdfReader::page_count(&doc);
    let out_dir = ctx.prepare_output_dir().await?;
    let stem = file_stem(&source);

    info!(file = %source.display(), pages = total, "Splitting document");
    ctx.start_progress(total as usize);

    for page in 1..=total {
        ctx.checkpoint()?;

        let destination = out_dir.join(format!("{stem}_{page}.pdf"));
        let result = {
            let doc = Arc::clone(&doc);
            let source = source.clone();
            let target = destination.clone();
            blocking(move || {
                let mut single = PageExtractor::extract_page(&doc, &source, page)?;
                PdfWriter::write(&mut single, &target)
            })
            .await
        };

        match result {
            Ok(()) => {
                ctx.events()
                    .info(format!("Created: {}", display_name(&destination)));
                ctx.commit_output(destination);
            }
            Err(err) => ctx.record_failure(&source, format!("page {page}: {err}")),
        }

        ctx.advance_progress();
    }

    Ok(())
}
