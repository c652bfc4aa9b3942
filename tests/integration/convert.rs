//! Integration tests for the convert-to-JPG operation.

use std::fs;
use std::sync::Arc;

use mergesplit::config::Settings;
use mergesplit::job::{JobController, JobStatus, OperationKind};
use tempfile::TempDir;

use crate::common::{
    FakeRasterizer, expected_dir, file_names, files, log_lines, progress_values, run_job,
    settings, write_pdf,
};

fn controller(settings: Settings, rasterizer: FakeRasterizer) -> JobController {
    JobController::new(settings).with_rasterizer(Arc::new(rasterizer))
}

#[tokio::test]
async fn test_convert_names_pages_without_separator() {
    let tmp = TempDir::new().unwrap();
    let source = write_pdf(&tmp.path().join("in").join("scan.pdf"), "Scan", 3);
    let base = tmp.path().join("out");
    let controller = controller(settings(&base), FakeRasterizer::default());

    let (events, outcome) =
        run_job(&controller, OperationKind::ConvertToImage, files(&[&source])).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert!(!outcome.has_failures());
    assert_eq!(
        file_names(&outcome.outputs),
        vec!["scan1.jpg", "scan2.jpg", "scan3.jpg"]
    );

    let dir = expected_dir(&base, OperationKind::ConvertToImage, None);
    for name in ["scan1.jpg", "scan2.jpg", "scan3.jpg"] {
        let bytes = fs::read(dir.join(name)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "{name} is not a JPEG");
    }

    assert_eq!(progress_values(&events), vec![33, 66, 100]);
    assert!(log_lines(&events).contains(&"Created JPG: scan2.jpg".to_string()));
}

#[tokio::test]
async fn test_convert_single_page_uses_plain_stem() {
    let tmp = TempDir::new().unwrap();
    let source = write_pdf(&tmp.path().join("in").join("cover.pdf"), "Cover", 1);
    let base = tmp.path().join("out");
    let controller = controller(settings(&base), FakeRasterizer::default());

    let (_, outcome) = run_job(&controller, OperationKind::ConvertToImage, files(&[&source])).await;

    assert_eq!(file_names(&outcome.outputs), vec!["cover.jpg"]);
}

#[tokio::test]
async fn test_convert_respects_reachable_ceiling() {
    let tmp = TempDir::new().unwrap();
    let source = write_pdf(&tmp.path().join("in").join("photo.pdf"), "Photo", 2);
    let base = tmp.path().join("out");
    let rasterizer = FakeRasterizer {
        size: Some((256, 256)),
        ..Default::default()
    };
    let settings = Settings {
        max_jpg_kb: 60,
        ..settings(&base)
    };
    let controller = controller(settings, rasterizer);

    let (_, outcome) = run_job(&controller, OperationKind::ConvertToImage, files(&[&source])).await;

    assert_eq!(outcome.outputs.len(), 2);
    for output in &outcome.outputs {
        assert!(fs::metadata(output).unwrap().len() <= 60 * 1024);
    }
}

#[tokio::test]
async fn test_convert_unreachable_ceiling_still_writes() {
    let tmp = TempDir::new().unwrap();
    let source = write_pdf(&tmp.path().join("in").join("dense.pdf"), "Dense", 1);
    let base = tmp.path().join("out");
    let rasterizer = FakeRasterizer {
        size: Some((256, 256)),
        ..Default::default()
    };
    let settings = Settings {
        max_jpg_kb: 1,
        ..settings(&base)
    };
    let controller = controller(settings, rasterizer);

    let (_, outcome) = run_job(&controller, OperationKind::ConvertToImage, files(&[&source])).await;

    // Best effort at the quality floor is not an error
    assert!(!outcome.has_failures());
    assert_eq!(outcome.outputs.len(), 1);
    assert!(fs::metadata(&outcome.outputs[0]).unwrap().len() > 1024);
}

#[tokio::test]
async fn test_convert_records_failed_page() {
    let tmp = TempDir::new().unwrap();
    let source = write_pdf(&tmp.path().join("in").join("doc.pdf"), "Doc", 3);
    let base = tmp.path().join("out");
    let controller = controller(settings(&base), FakeRasterizer::failing_on(2));

    let (events, outcome) =
        run_job(&controller, OperationKind::ConvertToImage, files(&[&source])).await;

    assert_eq!(file_names(&outcome.outputs), vec!["doc1.jpg", "doc3.jpg"]);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].context, "Convert PDF to JPG");
    assert!(outcome.errors[0].message.starts_with("page 2:"));
    assert_eq!(progress_values(&events), vec![33, 66, 100]);
}

#[tokio::test]
async fn test_convert_missing_renderer_is_one_fatal_record() {
    let tmp = TempDir::new().unwrap();
    let source = write_pdf(&tmp.path().join("in").join("doc.pdf"), "Doc", 5);
    let base = tmp.path().join("out");
    let settings = Settings {
        tool_path: Some(tmp.path().join("no-such-gs")),
        ..settings(&base)
    };
    let controller = JobController::new(settings);

    let (events, outcome) =
        run_job(&controller, OperationKind::ConvertToImage, files(&[&source])).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert!(outcome.outputs.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].file, source);
    assert!(!outcome.errors[0].message.starts_with("page "));
    // The job stops at the first page
    assert!(progress_values(&events).is_empty());
}
