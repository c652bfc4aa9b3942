//! Page rasterization.
//!
//! Rendering sits behind [`PageRasterizer`] so the convert operation does not
//! care what draws the page. The shipped implementation drives Ghostscript's
//! `png16m` device for one page at a time and decodes the PNG it writes to
//! stdout.

use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::{MergeSplitError, Result};

/// Resolution pages are rendered at.
pub const RENDER_DPI: u32 = 300;

/// Renders a single page of a PDF to a raster image.
pub trait PageRasterizer: Send + Sync {
    /// Render 1-indexed `page` of `source` at `dpi`.
    fn render(&self, source: &Path, page: u32, dpi: u32) -> Result<DynamicImage>;
}

/// Rasterizer backed by the Ghostscript binary.
#[derive(Debug, Clone)]
pub struct GhostscriptRasterizer {
    tool: PathBuf,
}

impl GhostscriptRasterizer {
    /// Create a rasterizer that runs `tool`.
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    /// Arguments for rendering one page to PNG on stdout.
    pub fn build_args(source: &Path, page: u32, dpi: u32) -> Vec<String> {
        vec![
            "-sDEVICE=png16m".to_string(),
            format!("-r{dpi}"),
            format!("-dFirstPage={page}"),
            format!("-dLastPage={page}"),
            "-dNOPAUSE".to_string(),
            "-dQUIET".to_string(),
            "-dBATCH".to_string(),
            "-dSAFER".to_string(),
            "-sOutputFile=-".to_string(),
            source.display().to_string(),
        ]
    }
}

impl PageRasterizer for GhostscriptRasterizer {
    fn render(&self, source: &Path, page: u32, dpi: u32) -> Result<DynamicImage> {
        let args = Self::build_args(source, page, dpi);
        debug!(tool = %self.tool.display(), ?args, "Rendering page");

        let output = Command::new(&self.tool)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| MergeSplitError::ToolLaunchFailed {
                tool: self.tool.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MergeSplitError::render_failed(
                page,
                format!("{} ({})", output.status, stderr.trim()),
            ));
        }

        if output.stdout.is_empty() {
            return Err(MergeSplitError::render_failed(page, "renderer produced no image"));
        }

        image::load_from_memory(&output.stdout)
            .map_err(|err| MergeSplitError::render_failed(page, err.to_string()))
    }
}
