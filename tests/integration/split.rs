//! Integration tests for the split operation.

use std::fs;

use mergesplit::job::{JobController, JobEvent, JobStatus, OperationKind};
use tempfile::TempDir;

use crate::common::{
    expected_dir, file_names, files, log_lines, page_content, page_count, progress_values,
    run_job, settings, write_corrupt_pdf, write_pdf,
};

#[tokio::test]
async fn test_split_writes_one_file_per_page() {
    let tmp = TempDir::new().unwrap();
    let source = write_pdf(&tmp.path().join("in").join("report.pdf"), "Report", 5);
    let base = tmp.path().join("out");
    let controller = JobController::new(settings(&base));

    let (events, outcome) = run_job(&controller, OperationKind::Split, files(&[&source])).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert!(!outcome.has_failures());
    assert_eq!(
        file_names(&outcome.outputs),
        vec![
            "report_1.pdf",
            "report_2.pdf",
            "report_3.pdf",
            "report_4.pdf",
            "report_5.pdf"
        ]
    );

    let dir = expected_dir(&base, OperationKind::Split, Some("in"));
    for page in 1..=5 {
        let output = dir.join(format!("report_{page}.pdf"));
        assert_eq!(page_count(&output), 1);
        assert!(page_content(&output, 1).contains(&format!("Report page {page}")));
    }

    assert_eq!(progress_values(&events), vec![20, 40, 60, 80, 100]);
    assert!(log_lines(&events).contains(&"Created: report_3.pdf".to_string()));
}

#[tokio::test]
async fn test_split_records_failed_page_and_continues() {
    let tmp = TempDir::new().unwrap();
    let source = write_pdf(&tmp.path().join("in").join("doc.pdf"), "Doc", 5);
    let base = tmp.path().join("out");

    // A directory where page 3's file should go makes that write fail
    let dir = expected_dir(&base, OperationKind::Split, Some("in"));
    fs::create_dir_all(dir.join("doc_3.pdf")).unwrap();

    let controller = JobController::new(settings(&base));
    let (events, outcome) = run_job(&controller, OperationKind::Split, files(&[&source])).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(
        file_names(&outcome.outputs),
        vec!["doc_1.pdf", "doc_2.pdf", "doc_4.pdf", "doc_5.pdf"]
    );
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].context, "Split PDF");
    assert!(outcome.errors[0].message.starts_with("page 3:"));

    // The failed page still counts as processed
    assert_eq!(progress_values(&events), vec![20, 40, 60, 80, 100]);

    let report = events.iter().find_map(|e| match e {
        JobEvent::ErrorReport { records } => Some(records.clone()),
        _ => None,
    });
    assert_eq!(report.unwrap().len(), 1);
}

#[tokio::test]
async fn test_split_is_repeatable() {
    let tmp = TempDir::new().unwrap();
    let source = write_pdf(&tmp.path().join("in").join("doc.pdf"), "Doc", 3);

    let first_base = tmp.path().join("first");
    let second_base = tmp.path().join("second");
    let (_, first) = run_job(
        &JobController::new(settings(&first_base)),
        OperationKind::Split,
        files(&[&source]),
    )
    .await;
    let (_, second) = run_job(
        &JobController::new(settings(&second_base)),
        OperationKind::Split,
        files(&[&source]),
    )
    .await;

    assert_eq!(file_names(&first.outputs), file_names(&second.outputs));
    for (a, b) in first.outputs.iter().zip(&second.outputs) {
        assert_eq!(page_content(a, 1), page_content(b, 1));
    }
}

#[tokio::test]
async fn test_split_unreadable_input_ends_with_one_record() {
    let tmp = TempDir::new().unwrap();
    let source = write_corrupt_pdf(&tmp.path().join("in").join("broken.pdf"));
    let base = tmp.path().join("out");
    let controller = JobController::new(settings(&base));

    let (events, outcome) = run_job(&controller, OperationKind::Split, files(&[&source])).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert!(outcome.outputs.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].file, source);
    assert!(matches!(events.last(), Some(JobEvent::Finished { .. })));
}
