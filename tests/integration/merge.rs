//! Integration tests for the merge operation.

use mergesplit::MergeSplitError;
use mergesplit::job::{JobController, JobRequest, JobStatus, OperationKind, Selection};
use tempfile::TempDir;

use crate::common::{
    expected_dir, file_names, files, log_lines, page_content, page_count, progress_values,
    run_job, settings, write_corrupt_pdf, write_pdf,
};

#[tokio::test]
async fn test_folder_merge_groups_by_prefix() {
    let tmp = TempDir::new().unwrap();
    let folder = tmp.path().join("scans");
    let a1 = write_pdf(&folder.join("A_1.pdf"), "A1", 2);
    let a2 = write_pdf(&folder.join("A_2.pdf"), "A2", 1);
    let b1 = write_pdf(&folder.join("B_1.pdf"), "B1", 3);

    let base = tmp.path().join("out");
    let controller = JobController::new(settings(&base));
    let selection = Selection::Folder {
        folder: folder.clone(),
        files: vec![b1, a2, a1],
    };

    let (events, outcome) = run_job(&controller, OperationKind::Merge, selection).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert!(!outcome.has_failures(), "{:?}", outcome.errors);
    assert_eq!(file_names(&outcome.outputs), vec!["A.pdf", "B.pdf"]);

    let dir = expected_dir(&base, OperationKind::Merge, Some("scans"));
    let merged_a = dir.join("A.pdf");
    let merged_b = dir.join("B.pdf");
    assert_eq!(page_count(&merged_a), 3);
    assert_eq!(page_count(&merged_b), 3);

    // Members are merged in file name order
    assert!(page_content(&merged_a, 1).contains("A1 page 1"));
    assert!(page_content(&merged_a, 2).contains("A1 page 2"));
    assert!(page_content(&merged_a, 3).contains("A2 page 1"));
    assert!(page_content(&merged_b, 3).contains("B1 page 3"));

    // One tick per group
    assert_eq!(progress_values(&events), vec![50, 100]);

    let lines = log_lines(&events);
    assert!(lines.contains(&"Merging: A_1.pdf".to_string()));
    assert!(lines.contains(&"Finished: A.pdf".to_string()));
    assert!(lines.contains(&"Finished: B.pdf".to_string()));
    assert!(lines.contains(&"Merge finished.".to_string()));
}

#[tokio::test]
async fn test_explicit_merge_uses_first_stem() {
    let tmp = TempDir::new().unwrap();
    let first = write_pdf(&tmp.path().join("in").join("cover.pdf"), "Cover", 1);
    let second = write_pdf(&tmp.path().join("in").join("body.pdf"), "Body", 2);

    let base = tmp.path().join("out");
    let controller = JobController::new(settings(&base));
    let (events, outcome) =
        run_job(&controller, OperationKind::Merge, files(&[&first, &second])).await;

    assert!(!outcome.has_failures());
    let output = expected_dir(&base, OperationKind::Merge, Some("in")).join("cover.pdf");
    assert_eq!(outcome.outputs, vec![output.clone()]);
    assert_eq!(page_count(&output), 3);
    // Selection order, not name order
    assert!(page_content(&output, 1).contains("Cover page 1"));
    assert!(page_content(&output, 2).contains("Body page 1"));

    // One tick per source
    assert_eq!(progress_values(&events), vec![50, 100]);
}

#[tokio::test]
async fn test_explicit_merge_with_one_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let only = write_pdf(&tmp.path().join("only.pdf"), "Only", 1);
    let base = tmp.path().join("out");
    let controller = JobController::new(settings(&base));

    let result = controller.start(JobRequest::new(OperationKind::Merge, files(&[&only])));

    assert!(matches!(
        result.err(),
        Some(MergeSplitError::InsufficientInput {
            required: 2,
            provided: 1
        })
    ));
    assert!(!base.exists());
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_unloadable_source_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let folder = tmp.path().join("in");
    let good1 = write_pdf(&folder.join("one.pdf"), "One", 1);
    let broken = write_corrupt_pdf(&folder.join("two.pdf"));
    let good2 = write_pdf(&folder.join("three.pdf"), "Three", 2);

    let base = tmp.path().join("out");
    let controller = JobController::new(settings(&base));
    let (events, outcome) = run_job(
        &controller,
        OperationKind::Merge,
        files(&[&good1, &broken, &good2]),
    )
    .await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].context, "Merge PDF");
    assert_eq!(outcome.errors[0].file, broken);

    assert_eq!(outcome.outputs.len(), 1);
    assert_eq!(page_count(&outcome.outputs[0]), 3);

    // Every attempted source counts toward progress
    assert_eq!(progress_values(&events), vec![33, 66, 100]);
    assert!(
        log_lines(&events)
            .iter()
            .any(|line| line == "Merge finished with 1 error(s).")
    );
}

#[tokio::test]
async fn test_group_without_loadable_sources_produces_nothing() {
    let tmp = TempDir::new().unwrap();
    let folder = tmp.path().join("batch");
    let a1 = write_pdf(&folder.join("A_1.pdf"), "A1", 1);
    let c1 = write_corrupt_pdf(&folder.join("C_1.pdf"));
    let c2 = write_corrupt_pdf(&folder.join("C_2.pdf"));

    let base = tmp.path().join("out");
    let controller = JobController::new(settings(&base));
    let selection = Selection::Folder {
        folder: folder.clone(),
        files: vec![a1, c1.clone(), c2],
    };
    let (_, outcome) = run_job(&controller, OperationKind::Merge, selection).await;

    assert_eq!(file_names(&outcome.outputs), vec!["A.pdf"]);
    // Two load failures plus one for the empty group
    assert_eq!(outcome.errors.len(), 3);
    assert_eq!(outcome.errors[2].file, c1);

    let dir = expected_dir(&base, OperationKind::Merge, Some("batch"));
    assert!(!dir.join("C.pdf").exists());
}

#[tokio::test]
async fn test_cancel_keeps_finished_groups_and_drops_the_rest() {
    let tmp = TempDir::new().unwrap();
    let folder = tmp.path().join("batch");
    let mut members = vec![write_pdf(&folder.join("A_1.pdf"), "A1", 1)];
    // Enough sources in B that cancellation lands while B is being collected
    for n in 1..=30 {
        members.push(write_pdf(&folder.join(format!("B_{n:02}.pdf")), "B", 40));
    }
    members.push(write_pdf(&folder.join("C_1.pdf"), "C1", 1));

    let base = tmp.path().join("out");
    let controller = JobController::new(settings(&base));
    let selection = Selection::Folder {
        folder: folder.clone(),
        files: members,
    };
    let mut handle = controller
        .start(JobRequest::new(OperationKind::Merge, selection))
        .unwrap();

    while let Some(event) = handle.next_event().await {
        if event.log_message() == Some("Finished: A.pdf") {
            handle.cancel();
            break;
        }
    }
    let (events, outcome) = handle.run_to_end().await.unwrap();

    assert_eq!(outcome.status, JobStatus::Cancelled);
    assert_eq!(file_names(&outcome.outputs), vec!["A.pdf"]);
    assert!(!outcome.has_failures());

    let dir = expected_dir(&base, OperationKind::Merge, Some("batch"));
    assert!(dir.join("A.pdf").exists());
    assert!(!dir.join("B.pdf").exists());
    assert!(!dir.join("C.pdf").exists());
    assert!(log_lines(&events).contains(&"Merge cancelled.".to_string()));
}
