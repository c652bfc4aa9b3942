//! Shared fixtures for the integration tests.
//!
//! PDFs are generated on the fly with lopdf so every test owns its inputs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Local;
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use mergesplit::config::Settings;
use mergesplit::job::{
    JobController, JobEvent, JobOutcome, JobRequest, OperationKind, Selection, output_dir,
};
use mergesplit::render::PageRasterizer;
use mergesplit::{MergeSplitError, Result};

/// Write a PDF whose page `n` draws the text `"<label> page <n>"`.
pub fn write_pdf(path: &Path, label: &str, pages: u32) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("{label} page {n}"))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    doc.save(path).unwrap();
    path.to_path_buf()
}

/// Write a file with a `.pdf` name that is not a PDF.
pub fn write_corrupt_pdf(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"this is not a pdf").unwrap();
    path.to_path_buf()
}

pub fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

/// Decoded content stream of 1-indexed `page` in the PDF at `path`.
pub fn page_content(path: &Path, page: u32) -> String {
    let doc = Document::load(path).unwrap();
    let page_id = doc.get_pages()[&page];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

pub fn settings(base: &Path) -> Settings {
    Settings {
        output_base: base.to_path_buf(),
        ..Default::default()
    }
}

/// Where a job of `kind` started today writes its results.
pub fn expected_dir(base: &Path, kind: OperationKind, source_folder: Option<&str>) -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    output_dir(base, kind, &today, source_folder)
}

pub fn files(paths: &[&PathBuf]) -> Selection {
    Selection::Files(paths.iter().map(|p| (*p).clone()).collect())
}

/// Start a job and collect all of its events and its outcome.
pub async fn run_job(
    controller: &JobController,
    kind: OperationKind,
    selection: Selection,
) -> (Vec<JobEvent>, JobOutcome) {
    controller
        .start(JobRequest::new(kind, selection))
        .unwrap()
        .run_to_end()
        .await
        .unwrap()
}

/// Messages of every log event, in order.
pub fn log_lines(events: &[JobEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.log_message().map(str::to_string))
        .collect()
}

/// Progress percentages, in order.
pub fn progress_values(events: &[JobEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

/// Rasterizer that draws a noisy image instead of rendering the page.
#[derive(Debug, Clone, Default)]
pub struct FakeRasterizer {
    pub fail_page: Option<u32>,
    pub delay: Option<Duration>,
    pub size: Option<(u32, u32)>,
}

impl FakeRasterizer {
    pub fn failing_on(page: u32) -> Self {
        Self {
            fail_page: Some(page),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }
}

impl PageRasterizer for FakeRasterizer {
    fn render(&self, _source: &Path, page: u32, _dpi: u32) -> Result<DynamicImage> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if self.fail_page == Some(page) {
            return Err(MergeSplitError::render_failed(page, "simulated failure"));
        }

        let (width, height) = self.size.unwrap_or((64, 64));
        let mut state = 0x9E37_79B9_u32.wrapping_add(page);
        let img = RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        });
        Ok(DynamicImage::ImageRgb8(img))
    }
}

/// Write an executable shell script standing in for Ghostscript.
///
/// The script writes `size` bytes to the `-sOutputFile=` target, prints one
/// line on stdout and one on stderr, then runs `tail` (e.g. `exit 0`).
#[cfg(unix)]
pub fn write_stub_tool(dir: &Path, size: u64, tail: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
out=""
for arg in "$@"; do
  case "$arg" in
    -sOutputFile=*) out="${{arg#-sOutputFile=}}" ;;
  esac
done
echo "Processing document"
echo "stub diagnostics" >&2
if [ -n "$out" ]; then
  head -c {size} /dev/zero > "$out"
fi
{tail}
"#
    );

    let path = dir.join("fake-gs");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
