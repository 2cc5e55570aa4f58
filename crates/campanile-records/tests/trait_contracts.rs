//! Trait contract tests for RecordStore, EvaluationSink, and ProgressSink.
//!
//! These tests verify the behavioral contracts of the collaborator traits
//! using the in-memory fakes. Any conforming implementation must pass these.

use chrono::Utc;
use campanile_records::fakes::{MemoryEvaluationSink, MemoryProgressSink, MemoryRecordStore};
use campanile_records::traits::{EvaluationSink, ProgressSink, RecordStore};
use campanile_records::{
    AcademicSnapshot, BatchRunId, CalculationKind, CourseAttempt, EvaluationPeriod,
    EvaluationRecord, RecordsError, SapStatus, StudentId,
};

fn sample_attempt(course: &str, credits: f64, points: f64) -> CourseAttempt {
    CourseAttempt {
        attempt_id: format!("{course}-1"),
        course_id: course.to_string(),
        term_id: "2025-FA".to_string(),
        credits,
        grade: Some("B".to_string()),
        grade_points: Some(points),
        include_in_gpa: true,
        earned: points > 0.0,
        is_repeat: false,
        repeat_policy: None,
        replaces_attempt_id: None,
    }
}

fn sample_snapshot(id: &str) -> AcademicSnapshot {
    AcademicSnapshot {
        student_id: StudentId::new(id),
        captured_at: Utc::now(),
        attempts: vec![sample_attempt("MATH-201", 3.0, 3.0)],
        program_credits: 120.0,
        previous_sap_status: None,
        appeal_approved: false,
        on_academic_plan: false,
        term_gpa: None,
        term_earned_credits: None,
    }
}

fn sample_record(id: &str, period: &str, kind: CalculationKind) -> EvaluationRecord {
    EvaluationRecord {
        student_id: StudentId::new(id),
        period: EvaluationPeriod::new(period),
        kind,
        result: serde_json::json!({"cumulative_gpa": 3.0}),
        run_id: Some(BatchRunId::new()),
        computed_at: Utc::now(),
    }
}

// ===========================================================================
// RecordStore contract tests
// ===========================================================================

#[tokio::test]
async fn store_snapshot_round_trip() {
    let store = MemoryRecordStore::new();
    store.insert_snapshot(sample_snapshot("S-1"));

    let snapshot = store.snapshot(&StudentId::new("S-1")).await.unwrap();
    assert_eq!(snapshot.student_id, StudentId::new("S-1"));
    assert_eq!(snapshot.attempts.len(), 1);
}

#[tokio::test]
async fn store_snapshot_not_found() {
    let store = MemoryRecordStore::new();
    let err = store.snapshot(&StudentId::new("missing")).await.unwrap_err();

    assert!(matches!(err, RecordsError::SnapshotNotFound { .. }));
}

#[tokio::test]
async fn store_injected_failure_surfaces_as_query_error() {
    let store = MemoryRecordStore::new();
    store.insert_snapshot(sample_snapshot("S-1"));
    store.fail_snapshot_for(&StudentId::new("S-1"));

    let err = store.snapshot(&StudentId::new("S-1")).await.unwrap_err();
    assert!(matches!(err, RecordsError::Query(_)));
}

#[tokio::test]
async fn store_cohort_lists_each_student_once_sorted() {
    let store = MemoryRecordStore::new();
    store.insert_snapshot(sample_snapshot("S-2"));
    store.insert_snapshot(sample_snapshot("S-1"));
    store.insert_snapshot(sample_snapshot("S-1"));

    let cohort = store.eligible_cohort(CalculationKind::Sap).await.unwrap();
    assert_eq!(cohort, vec![StudentId::new("S-1"), StudentId::new("S-2")]);
}

#[tokio::test]
async fn store_cohort_includes_students_with_failing_snapshots() {
    let store = MemoryRecordStore::new();
    store.insert_snapshot(sample_snapshot("S-1"));
    store.fail_snapshot_for(&StudentId::new("S-2"));

    let cohort = store.eligible_cohort(CalculationKind::Gpa).await.unwrap();
    assert_eq!(cohort, vec![StudentId::new("S-1"), StudentId::new("S-2")]);
}

// ===========================================================================
// EvaluationSink contract tests
// ===========================================================================

#[tokio::test]
async fn sink_upsert_inserts_record() {
    let sink = MemoryEvaluationSink::new();
    let record = sample_record("S-1", "2026-SP", CalculationKind::Sap);
    sink.upsert_evaluation(&record).await.unwrap();

    assert_eq!(sink.evaluation_count(), 1);
    let stored = sink
        .evaluation(&StudentId::new("S-1"), "2026-SP", CalculationKind::Sap)
        .unwrap();
    assert_eq!(stored.result, record.result);
}

#[tokio::test]
async fn sink_upsert_overwrites_on_natural_key() {
    let sink = MemoryEvaluationSink::new();
    let first = sample_record("S-1", "2026-SP", CalculationKind::Sap);
    sink.upsert_evaluation(&first).await.unwrap();

    let mut second = sample_record("S-1", "2026-SP", CalculationKind::Sap);
    second.result = serde_json::json!({"cumulative_gpa": 2.5});
    sink.upsert_evaluation(&second).await.unwrap();

    assert_eq!(sink.evaluation_count(), 1);
    let stored = sink
        .evaluation(&StudentId::new("S-1"), "2026-SP", CalculationKind::Sap)
        .unwrap();
    assert_eq!(stored.result, second.result);
}

#[tokio::test]
async fn sink_distinct_keys_do_not_collide() {
    let sink = MemoryEvaluationSink::new();
    sink.upsert_evaluation(&sample_record("S-1", "2026-SP", CalculationKind::Sap))
        .await
        .unwrap();
    sink.upsert_evaluation(&sample_record("S-1", "2026-FA", CalculationKind::Sap))
        .await
        .unwrap();
    sink.upsert_evaluation(&sample_record("S-1", "2026-SP", CalculationKind::Gpa))
        .await
        .unwrap();

    assert_eq!(sink.evaluation_count(), 3);
}

#[tokio::test]
async fn sink_updates_denormalized_standing() {
    let sink = MemoryEvaluationSink::new();
    let student = StudentId::new("S-1");
    assert_eq!(sink.standing(&student), None);

    sink.update_sap_standing(&student, SapStatus::Warning)
        .await
        .unwrap();
    assert_eq!(sink.standing(&student), Some(SapStatus::Warning));

    sink.update_sap_standing(&student, SapStatus::Satisfactory)
        .await
        .unwrap();
    assert_eq!(sink.standing(&student), Some(SapStatus::Satisfactory));
}

#[tokio::test]
async fn sink_injected_failure_surfaces_as_query_error() {
    let sink = MemoryEvaluationSink::new();
    sink.fail_upsert_for(&StudentId::new("S-1"));

    let err = sink
        .upsert_evaluation(&sample_record("S-1", "2026-SP", CalculationKind::Gpa))
        .await
        .unwrap_err();
    assert!(matches!(err, RecordsError::Query(_)));
    assert_eq!(sink.evaluation_count(), 0);
}

// ===========================================================================
// ProgressSink contract tests
// ===========================================================================

#[tokio::test]
async fn progress_reports_recorded_in_order() {
    let sink = MemoryProgressSink::new();
    let run = BatchRunId::new();

    sink.report_progress(&run, 25).await.unwrap();
    sink.report_progress(&run, 50).await.unwrap();
    sink.report_progress(&run, 100).await.unwrap();

    let reports = sink.reports();
    assert_eq!(reports.len(), 3);
    assert_eq!(
        reports.iter().map(|(_, p)| *p).collect::<Vec<_>>(),
        vec![25, 50, 100]
    );
    assert_eq!(sink.last_percent(), Some(100));
}
