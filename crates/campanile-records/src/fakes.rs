//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `MemoryRecordStore`, `MemoryEvaluationSink`, and
//! `MemoryProgressSink` that satisfy the trait contracts without any
//! external dependencies. The store and sink support per-student failure
//! injection so partial-failure orchestration paths can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{RecordsError, RecordsResult};
use crate::schema::{
    AcademicSnapshot, BatchRunId, CalculationKind, EvaluationRecord, SapStatus, StudentId,
};
use crate::traits::{EvaluationSink, ProgressSink, RecordStore};

// ---------------------------------------------------------------------------
// MemoryRecordStore
// ---------------------------------------------------------------------------

/// In-memory record store backed by a `HashMap<student, snapshot>`.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    snapshots: Mutex<HashMap<String, AcademicSnapshot>>,
    failing: Mutex<HashSet<String>>,
    cohort_failing: Mutex<bool>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snapshot for lookup and cohort membership.
    pub fn insert_snapshot(&self, snapshot: AcademicSnapshot) {
        let mut snapshots = self.snapshots.lock().unwrap();
        snapshots.insert(snapshot.student_id.0.clone(), snapshot);
    }

    /// Make `snapshot()` fail for this student with a query error.
    pub fn fail_snapshot_for(&self, student: &StudentId) {
        let mut failing = self.failing.lock().unwrap();
        failing.insert(student.0.clone());
    }

    /// Make `eligible_cohort()` fail with a query error.
    pub fn fail_cohort(&self) {
        *self.cohort_failing.lock().unwrap() = true;
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn snapshot(&self, student: &StudentId) -> RecordsResult<AcademicSnapshot> {
        if self.failing.lock().unwrap().contains(&student.0) {
            return Err(RecordsError::Query(format!(
                "injected snapshot failure for {student}"
            )));
        }
        let snapshots = self.snapshots.lock().unwrap();
        snapshots
            .get(&student.0)
            .cloned()
            .ok_or_else(|| RecordsError::SnapshotNotFound {
                student_id: student.0.clone(),
            })
    }

    async fn eligible_cohort(&self, _kind: CalculationKind) -> RecordsResult<Vec<StudentId>> {
        if *self.cohort_failing.lock().unwrap() {
            return Err(RecordsError::Query(
                "injected cohort query failure".to_string(),
            ));
        }
        let snapshots = self.snapshots.lock().unwrap();
        let failing = self.failing.lock().unwrap();
        // Students with a failing snapshot are still cohort members; the
        // failure surfaces per entity during evaluation.
        let mut ids: Vec<String> = snapshots
            .keys()
            .chain(failing.iter())
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort();
        Ok(ids.into_iter().map(StudentId).collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryEvaluationSink
// ---------------------------------------------------------------------------

type NaturalKey = (String, String, &'static str);

/// In-memory evaluation sink backed by a `HashMap<natural key, record>`.
#[derive(Debug, Default)]
pub struct MemoryEvaluationSink {
    evaluations: Mutex<HashMap<NaturalKey, EvaluationRecord>>,
    standings: Mutex<HashMap<String, SapStatus>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryEvaluationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `upsert_evaluation()` fail for this student.
    pub fn fail_upsert_for(&self, student: &StudentId) {
        let mut failing = self.failing.lock().unwrap();
        failing.insert(student.0.clone());
    }

    /// Number of stored evaluation records.
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.lock().unwrap().len()
    }

    /// Fetch a stored record by natural key.
    pub fn evaluation(
        &self,
        student: &StudentId,
        period: &str,
        kind: CalculationKind,
    ) -> Option<EvaluationRecord> {
        let evaluations = self.evaluations.lock().unwrap();
        evaluations
            .get(&(student.0.clone(), period.to_string(), kind.as_str()))
            .cloned()
    }

    /// The denormalized current SAP standing for a student, if written.
    pub fn standing(&self, student: &StudentId) -> Option<SapStatus> {
        self.standings.lock().unwrap().get(&student.0).copied()
    }
}

#[async_trait]
impl EvaluationSink for MemoryEvaluationSink {
    async fn upsert_evaluation(&self, record: &EvaluationRecord) -> RecordsResult<()> {
        if self.failing.lock().unwrap().contains(&record.student_id.0) {
            return Err(RecordsError::Query(format!(
                "injected upsert failure for {}",
                record.student_id
            )));
        }
        let mut evaluations = self.evaluations.lock().unwrap();
        evaluations.insert(record.natural_key(), record.clone());
        Ok(())
    }

    async fn update_sap_standing(
        &self,
        student: &StudentId,
        status: SapStatus,
    ) -> RecordsResult<()> {
        let mut standings = self.standings.lock().unwrap();
        standings.insert(student.0.clone(), status);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryProgressSink
// ---------------------------------------------------------------------------

/// In-memory progress sink that records every report it receives.
#[derive(Debug, Default)]
pub struct MemoryProgressSink {
    reports: Mutex<Vec<(BatchRunId, u8)>>,
}

impl MemoryProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All progress reports received, in arrival order.
    pub fn reports(&self) -> Vec<(BatchRunId, u8)> {
        self.reports.lock().unwrap().clone()
    }

    /// The last percentage reported, if any.
    pub fn last_percent(&self) -> Option<u8> {
        self.reports.lock().unwrap().last().map(|(_, p)| *p)
    }
}

#[async_trait]
impl ProgressSink for MemoryProgressSink {
    async fn report_progress(&self, run: &BatchRunId, percent: u8) -> RecordsResult<()> {
        let mut reports = self.reports.lock().unwrap();
        reports.push((run.clone(), percent));
        Ok(())
    }
}
