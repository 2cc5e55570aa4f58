//! Collaborator trait definitions for the policy engine
//!
//! These traits define the three seams the engine depends on:
//! - `RecordStore`: read-only access to academic snapshots and cohorts
//! - `EvaluationSink`: idempotent persistence of evaluation results
//! - `ProgressSink`: fire-and-forget progress reporting for batch runs
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::RecordsResult;
use crate::schema::{
    AcademicSnapshot, BatchRunId, CalculationKind, EvaluationRecord, SapStatus, StudentId,
};

// ---------------------------------------------------------------------------
// RecordStore — read-only academic data access
// ---------------------------------------------------------------------------

/// Read-only access to student academic data.
///
/// Guarantees:
/// - `snapshot` returns a self-contained, immutable capture; the engine
///   never needs a second round trip for the same evaluation.
/// - `eligible_cohort` returns each student at most once.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the academic snapshot for one student.
    ///
    /// Returns `RecordsError::SnapshotNotFound` when the student has no
    /// academic history on record.
    async fn snapshot(&self, student: &StudentId) -> RecordsResult<AcademicSnapshot>;

    /// List the students eligible for the given calculation kind
    /// (SAP: aid recipients; GPA: all active students).
    async fn eligible_cohort(&self, kind: CalculationKind) -> RecordsResult<Vec<StudentId>>;
}

// ---------------------------------------------------------------------------
// EvaluationSink — idempotent result persistence
// ---------------------------------------------------------------------------

/// Persistence seam for evaluation results.
///
/// Guarantees the engine relies on:
/// - `upsert_evaluation` is idempotent on the `(student, period, kind)`
///   natural key: delivering the same record twice, or overwriting with a
///   recomputed one, never duplicates rows. Last writer wins, which is
///   acceptable because the computation is deterministic for a snapshot.
/// - Delivery is at-least-once; the engine may retry across runs.
#[async_trait]
pub trait EvaluationSink: Send + Sync {
    /// Insert or overwrite the evaluation record for its natural key.
    async fn upsert_evaluation(&self, record: &EvaluationRecord) -> RecordsResult<()>;

    /// Update the denormalized current SAP standing on the student's
    /// aid record.
    async fn update_sap_standing(&self, student: &StudentId, status: SapStatus)
        -> RecordsResult<()>;
}

// ---------------------------------------------------------------------------
// ProgressSink — batch job reporting
// ---------------------------------------------------------------------------

/// Progress reporting seam for the job/queue collaborator.
///
/// Reports are fire-and-forget: the orchestrator logs failures but never
/// fails a run because a progress update was dropped.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Report batch progress as an integer percentage (0–100).
    async fn report_progress(&self, run: &BatchRunId, percent: u8) -> RecordsResult<()>;
}
