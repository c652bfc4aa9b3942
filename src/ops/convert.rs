use std::path::Path;
use tracing::{debug, info};

use super::{blocking, display_name};
use crate::encode::SizeBoundedEncoder;
use crate::error::{MergeSplitError, Result};
use crate::group::file_stem;
use crate::io::{OutputWriter, PdfReader};
use crate::job::JobContext;
use crate::render::RENDER_DPI;

/// Rasterize every page of the job's single input to a size-bounded JPG.
pub async fn run(ctx: &mut JobContext) -> Result<()> {
    let job = ctx.job();
    let source = job
        .primary_input()
        .ok_or_else(|| MergeSplitError::input_required("no file to convert"))?
        .to_path_buf();

    let path = source.clone();
    let total = blocking(move || PdfReader::read(&path).map(|doc| PdfReader::page_count(&doc)))
        .await?;
    let out_dir = ctx.prepare_output_dir().await?;
    let encoder = SizeBoundedEncoder::new(job.settings().max_jpg_bytes());
    let rasterizer = ctx.rasterizer();

    info!(
        file = %source.display(),
        pages = total,
        ceiling = encoder.ceiling(),
        "Converting document to JPG"
    );
    ctx.start_progress(total as usize);

    for page in 1..=total {
        ctx.checkpoint()?;

        let destination = out_dir.join(image_name(&source, page, total));
        let result = {
            let rasterizer = rasterizer.clone();
            let source = source.clone();
            let target = destination.clone();
            blocking(move || {
                let image = rasterizer.render(&source, page, RENDER_DPI)?;
                let encoded = encoder.encode(&image)?;
                OutputWriter::write_bytes(&target, &encoded.bytes)?;
                Ok(encoded)
            })
            .await
        };

        match result {
            Ok(encoded) => {
                debug!(
                    page,
                    quality = encoded.quality,
                    bytes = encoded.bytes.len(),
                    within = encoded.fits(encoder.ceiling()),
                    "Page encoded"
                );
                ctx.events()
                    .info(format!("Created JPG: {}", display_name(&destination)));
                ctx.commit_output(destination);
            }
            // A missing renderer fails every page the same way
            Err(err @ MergeSplitError::ToolLaunchFailed { .. }) => return Err(err),
            Err(err) => ctx.record_failure(&source, format!("page {page}: {err}")),
        }

        ctx.advance_progress();
    }

    Ok(())
}

/// `<stem>.jpg` for a one-page document, else `<stem><page>.jpg`.
fn image_name(source: &Path, page: u32, total: u32) -> String {
    let stem = file_stem(source);
    if total == 1 {
        format!("{stem}.jpg")
    } else {
        format!("{stem}{page}.jpg")
    }
}
