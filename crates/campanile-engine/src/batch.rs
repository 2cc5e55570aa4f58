//! Batch evaluation orchestration.
//!
//! Runs a calculator across a cohort in fixed-size sub-batches. Within a
//! sub-batch every student is evaluated on its own task and all outcomes
//! are joined before the run advances; one student's failure never aborts
//! siblings. Results are persisted through the idempotent sink, progress is
//! reported after every sub-batch, and a cooperative stop signal is checked
//! between sub-batches.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use campanile_records::{
    BatchRunId, CalculationKind, EvaluationPeriod, EvaluationRecord, EvaluationSink, ProgressSink,
    RecordStore, RecordsError, StudentId,
};

use crate::error::{EngineError, Result as EngineResult};
use crate::gpa::{calculate_gpa, GpaConfig};
use crate::sap::{evaluate_sap, SapInput, SapPolicy};

// ---------------------------------------------------------------------------
// Run configuration and state
// ---------------------------------------------------------------------------

/// Which students a batch run covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CohortSelector {
    /// An explicit student list.
    Students(Vec<StudentId>),
    /// Every student the store considers eligible for the calculation.
    AllEligible,
}

/// Policies injected into a batch run. Shared immutably across tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPolicies {
    pub gpa: GpaConfig,
    pub sap: SapPolicy,
}

impl Default for EvaluationPolicies {
    fn default() -> Self {
        Self {
            gpa: GpaConfig::default(),
            sap: SapPolicy::standard(),
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Students evaluated concurrently per sub-batch.
    pub sub_batch_size: usize,
    /// Cap on the collected error list; failures beyond it are counted but
    /// not retained.
    pub max_errors: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            sub_batch_size: 25,
            max_errors: 100,
        }
    }
}

/// Lifecycle state of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchRunState {
    Collecting,
    Processing,
    Completed,
    Failed,
}

/// Monotonic counters for one run. Discarded after the run; the terminal
/// snapshot becomes part of the [`BatchResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
}

impl BatchProgress {
    /// Integer completion percentage, 0–100.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed * 100) / self.total) as u8
    }
}

/// Per-student failure entry in the capped error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    pub student_id: StudentId,
    pub message: String,
}

/// Final summary of a batch run.
///
/// Counters always reconcile: `processed == successful + failed` and
/// `skipped() == total - processed`. The error list is capped and
/// non-exhaustive beyond `max_errors`; `errors_truncated` flags that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub run_id: BatchRunId,
    pub state: BatchRunState,
    pub kind: CalculationKind,
    pub period: EvaluationPeriod,
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub errors: Vec<BatchError>,
    pub errors_truncated: bool,
}

impl BatchResult {
    /// Cohort members never reached (cancellation or early stop).
    pub fn skipped(&self) -> usize {
        self.total - self.processed
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Batch evaluation orchestrator.
///
/// Owns no collaborator internals; everything flows through the injected
/// trait objects. Concurrent re-runs of the same cohort-period are safe
/// because persistence is an idempotent upsert on the natural key.
pub struct BatchRunner {
    store: Arc<dyn RecordStore>,
    sink: Arc<dyn EvaluationSink>,
    progress: Arc<dyn ProgressSink>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(
        store: Arc<dyn RecordStore>,
        sink: Arc<dyn EvaluationSink>,
        progress: Arc<dyn ProgressSink>,
        config: BatchConfig,
    ) -> Self {
        Self {
            store,
            sink,
            progress,
            config,
        }
    }

    /// Evaluate every cohort member and persist results.
    ///
    /// Per-student failures are captured in the result's error list; the
    /// only whole-run failure is a cohort-retrieval error. A cancellation
    /// signal, when supplied, is honored between sub-batches: in-flight
    /// work settles first and the run finishes as `Failed`.
    #[instrument(skip(self, selector, policies, cancel), fields(kind = %kind, period = %period))]
    pub async fn run(
        &self,
        selector: CohortSelector,
        kind: CalculationKind,
        period: EvaluationPeriod,
        policies: &EvaluationPolicies,
        cancel: Option<watch::Receiver<bool>>,
    ) -> EngineResult<BatchResult> {
        let run_id = BatchRunId::new();
        let start = Instant::now();

        // Collecting phase: a failure here is the only one that fails the
        // whole run.
        let students = match selector {
            CohortSelector::Students(ids) => ids,
            CohortSelector::AllEligible => self.store.eligible_cohort(kind).await?,
        };
        let mut state = BatchRunState::Processing;

        let mut progress = BatchProgress {
            total: students.len(),
            ..BatchProgress::default()
        };
        info!(run_id = %run_id, total = progress.total, "starting batch evaluation");

        let mut errors: Vec<BatchError> = Vec::new();
        let mut errors_truncated = false;

        for chunk in students.chunks(self.config.sub_batch_size.max(1)) {
            if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
                warn!(run_id = %run_id, "stop requested; halting before next sub-batch");
                state = BatchRunState::Failed;
                break;
            }

            let mut chunk_students = Vec::with_capacity(chunk.len());
            let mut handles = Vec::with_capacity(chunk.len());
            for student in chunk {
                let store = Arc::clone(&self.store);
                let sink = Arc::clone(&self.sink);
                let policies = policies.clone();
                let period = period.clone();
                let run_id = run_id.clone();
                let student = student.clone();
                chunk_students.push(student.clone());
                handles.push(tokio::spawn(async move {
                    evaluate_student(store, sink, &student, kind, &period, &policies, &run_id)
                        .await
                }));
            }

            // Settle-all: every sibling finishes regardless of failures.
            for (student, joined) in chunk_students.into_iter().zip(join_all(handles).await) {
                progress.processed += 1;
                let outcome = match joined {
                    Ok(outcome) => outcome,
                    Err(join_err) => Err(EngineError::Records(RecordsError::Query(format!(
                        "evaluation task aborted: {join_err}"
                    )))),
                };
                match outcome {
                    Ok(()) => progress.successful += 1,
                    Err(err) => {
                        progress.failed += 1;
                        warn!(student = %student, error = %err, "student evaluation failed");
                        if errors.len() < self.config.max_errors {
                            errors.push(BatchError {
                                student_id: student,
                                message: err.to_string(),
                            });
                        } else {
                            errors_truncated = true;
                        }
                    }
                }
            }

            // Fire-and-forget: a dropped progress report never fails the run.
            if let Err(err) = self.progress.report_progress(&run_id, progress.percent()).await {
                warn!(run_id = %run_id, error = %err, "progress report dropped");
            }
        }

        if state == BatchRunState::Processing {
            state = BatchRunState::Completed;
        }
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            successful = progress.successful,
            failed = progress.failed,
            skipped = progress.total - progress.processed,
            duration_ms,
            "batch evaluation finished"
        );

        Ok(BatchResult {
            run_id,
            state,
            kind,
            period,
            total: progress.total,
            processed: progress.processed,
            successful: progress.successful,
            failed: progress.failed,
            duration_ms,
            errors,
            errors_truncated,
        })
    }
}

/// Evaluate and persist one student.
///
/// A missing snapshot is reported as data incompleteness; store and sink
/// failures surface as per-student infrastructure errors.
async fn evaluate_student(
    store: Arc<dyn RecordStore>,
    sink: Arc<dyn EvaluationSink>,
    student: &StudentId,
    kind: CalculationKind,
    period: &EvaluationPeriod,
    policies: &EvaluationPolicies,
    run_id: &BatchRunId,
) -> EngineResult<()> {
    let snapshot = store.snapshot(student).await.map_err(|err| match err {
        RecordsError::SnapshotNotFound { student_id } => EngineError::MissingSnapshot { student_id },
        other => EngineError::Records(other),
    })?;

    let gpa = calculate_gpa(&snapshot.attempts, &policies.gpa)?;

    let (result, standing) = match kind {
        CalculationKind::Gpa => (serde_json::to_value(&gpa)?, None),
        CalculationKind::Sap => {
            let input = SapInput::from_snapshot(&snapshot, &gpa);
            let sap = evaluate_sap(&input, &policies.sap)?;
            let status = sap.status;
            (serde_json::to_value(&sap)?, Some(status))
        }
    };

    let record = EvaluationRecord {
        student_id: student.clone(),
        period: period.clone(),
        kind,
        result,
        run_id: Some(run_id.clone()),
        computed_at: Utc::now(),
    };
    sink.upsert_evaluation(&record).await?;

    if let Some(status) = standing {
        sink.update_sap_standing(student, status).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let mut progress = BatchProgress {
            total: 40,
            ..BatchProgress::default()
        };
        assert_eq!(progress.percent(), 0);
        progress.processed = 10;
        assert_eq!(progress.percent(), 25);
        progress.processed = 40;
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_empty_cohort_reports_complete() {
        let progress = BatchProgress::default();
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.sub_batch_size, 25);
        assert_eq!(config.max_errors, 100);
    }

    #[test]
    fn test_result_skipped_counts_unprocessed() {
        let result = BatchResult {
            run_id: BatchRunId::new(),
            state: BatchRunState::Failed,
            kind: CalculationKind::Sap,
            period: EvaluationPeriod::new("2026-SP"),
            total: 100,
            processed: 60,
            successful: 55,
            failed: 5,
            duration_ms: 12,
            errors: Vec::new(),
            errors_truncated: false,
        };
        assert_eq!(result.skipped(), 40);
        assert_eq!(result.processed, result.successful + result.failed);
    }
}
