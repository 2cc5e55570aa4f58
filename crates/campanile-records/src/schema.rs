//! Record types shared between the student-record stores and the policy engine.
//!
//! Everything in this module is a plain immutable value. Snapshots are
//! captured once per evaluation and never mutated in place; a regrade
//! produces a new snapshot rather than editing history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier for a student, assigned by the student-record system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn new(id: impl Into<String>) -> Self {
        StudentId(id.into())
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An evaluation period, e.g. an aid year or a term code ("2026-SP").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationPeriod(pub String);

impl EvaluationPeriod {
    pub fn new(period: impl Into<String>) -> Self {
        EvaluationPeriod(period.into())
    }
}

impl std::fmt::Display for EvaluationPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one batch evaluation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchRunId(pub String);

impl BatchRunId {
    /// Generate a new random run id.
    pub fn new() -> Self {
        BatchRunId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for BatchRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Course attempts and grades
// ---------------------------------------------------------------------------

/// How repeated attempts of the same course contribute to aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// The most recent attempt replaces all earlier ones.
    Replace,
    /// Every attempt contributes; the aggregate is the credit-weighted mean.
    Average,
    /// Only the attempt with the best grade points contributes.
    Highest,
    /// No deduplication; every attempt counts independently.
    AllCount,
}

impl std::fmt::Display for RepeatPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Average => write!(f, "average"),
            Self::Highest => write!(f, "highest"),
            Self::AllCount => write!(f, "all_count"),
        }
    }
}

/// One graded or in-progress enrollment instance.
///
/// Immutable once captured for a calculation. A regraded course produces a
/// fresh snapshot containing a new attempt; history is never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAttempt {
    /// Unique identifier for this attempt row.
    pub attempt_id: String,
    /// Course identity used for repeat detection ("MATH-201").
    pub course_id: String,
    /// Term the attempt belongs to ("2025-FA").
    pub term_id: String,
    /// Credit hours attempted.
    pub credits: f64,
    /// Grade code as posted ("A-", "W", "I"). `None` while in progress.
    pub grade: Option<String>,
    /// Grade points for the posted grade. `None` for non-point grades.
    pub grade_points: Option<f64>,
    /// Whether this attempt counts toward the GPA numerator/denominator.
    pub include_in_gpa: bool,
    /// Whether the credits were earned (completed successfully).
    pub earned: bool,
    /// Whether this attempt is a repeat of an earlier enrollment.
    pub is_repeat: bool,
    /// Repeat resolution policy for this course, when the catalog sets one.
    pub repeat_policy: Option<RepeatPolicy>,
    /// The attempt this one replaces, when known.
    pub replaces_attempt_id: Option<String>,
}

/// Institution-scoped definition of a single grade code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeDefinition {
    /// Grade code as posted on the transcript.
    pub code: String,
    /// Grade points, when the grade carries them.
    pub grade_points: Option<f64>,
    /// Whether the grade counts toward GPA.
    pub include_in_gpa: bool,
    /// Whether the grade earns credit.
    pub earns_credit: bool,
    /// Whether the grade counts as attempted credit.
    pub counts_attempted: bool,
    /// Incomplete marker ("I").
    pub is_incomplete: bool,
    /// Withdrawal marker ("W").
    pub is_withdrawal: bool,
}

/// Read-only grade-code table for one institution.
///
/// Rarely mutated; looked up during calculation only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeScale {
    pub grades: Vec<GradeDefinition>,
}

impl GradeScale {
    /// Look up a grade definition by code.
    pub fn definition(&self, code: &str) -> Option<&GradeDefinition> {
        self.grades.iter().find(|g| g.code == code)
    }

    /// Standard US 4.0 letter scale with W/I/P/NP/AU markers.
    pub fn standard() -> Self {
        fn letter(code: &str, points: f64) -> GradeDefinition {
            GradeDefinition {
                code: code.to_string(),
                grade_points: Some(points),
                include_in_gpa: true,
                earns_credit: points > 0.0,
                counts_attempted: true,
                is_incomplete: false,
                is_withdrawal: false,
            }
        }
        fn marker(code: &str, earns: bool, incomplete: bool, withdrawal: bool) -> GradeDefinition {
            GradeDefinition {
                code: code.to_string(),
                grade_points: None,
                include_in_gpa: false,
                earns_credit: earns,
                counts_attempted: !withdrawal,
                is_incomplete: incomplete,
                is_withdrawal: withdrawal,
            }
        }
        Self {
            grades: vec![
                letter("A", 4.0),
                letter("A-", 3.7),
                letter("B+", 3.3),
                letter("B", 3.0),
                letter("B-", 2.7),
                letter("C+", 2.3),
                letter("C", 2.0),
                letter("C-", 1.7),
                letter("D+", 1.3),
                letter("D", 1.0),
                letter("F", 0.0),
                marker("P", true, false, false),
                marker("NP", false, false, false),
                marker("I", false, true, false),
                marker("W", false, false, true),
                marker("AU", false, false, false),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// SAP standing
// ---------------------------------------------------------------------------

/// Satisfactory Academic Progress standing.
///
/// Ordering follows the federal progression: `satisfactory → warning →
/// probation | academic_plan → suspension | ineligible`. `Ineligible` is
/// terminal and only reached through max-timeframe exceedance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SapStatus {
    /// All components met; aid eligible.
    Satisfactory,
    /// First deficient evaluation; aid continues for one period.
    Warning,
    /// Deficient with an approved appeal.
    Probation,
    /// Deficient with an approved appeal and an academic plan on file.
    AcademicPlan,
    /// Deficient with no approved appeal; aid suspended.
    Suspension,
    /// Maximum timeframe exceeded; terminal.
    Ineligible,
}

impl SapStatus {
    /// Whether this standing keeps the student eligible for aid.
    pub fn eligible_for_aid(self) -> bool {
        matches!(
            self,
            Self::Satisfactory | Self::Warning | Self::Probation | Self::AcademicPlan
        )
    }

    /// Whether this standing can never improve in a later evaluation.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ineligible)
    }
}

impl std::fmt::Display for SapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfactory => write!(f, "satisfactory"),
            Self::Warning => write!(f, "warning"),
            Self::Probation => write!(f, "probation"),
            Self::AcademicPlan => write!(f, "academic_plan"),
            Self::Suspension => write!(f, "suspension"),
            Self::Ineligible => write!(f, "ineligible"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots and persisted evaluations
// ---------------------------------------------------------------------------

/// Per-student academic snapshot supplied by the record store.
///
/// One snapshot feeds exactly one evaluation; the engine never reaches back
/// into the store mid-calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicSnapshot {
    pub student_id: StudentId,
    /// When the snapshot was captured.
    pub captured_at: DateTime<Utc>,
    /// All enrollment attempts on record, in chronological order.
    pub attempts: Vec<CourseAttempt>,
    /// Published credit length of the student's program.
    pub program_credits: f64,
    /// Standing from the previous SAP evaluation, if one exists.
    pub previous_sap_status: Option<SapStatus>,
    /// Whether a SAP appeal was approved for the current period.
    pub appeal_approved: bool,
    /// Whether the student is on an academic plan.
    pub on_academic_plan: bool,
    /// GPA over the most recent term, when plan compliance is tracked.
    pub term_gpa: Option<f64>,
    /// Credits earned in the most recent term, when plan compliance is tracked.
    pub term_earned_credits: Option<f64>,
}

/// Which calculation a persisted evaluation record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationKind {
    Sap,
    Gpa,
}

impl CalculationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sap => "sap",
            Self::Gpa => "gpa",
        }
    }
}

impl std::fmt::Display for CalculationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One persisted evaluation result.
///
/// The natural key is `(student, period, kind)`. Re-running the same
/// cohort-period combination overwrites the prior record rather than
/// duplicating it; each overwrite carries a fresh `computed_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub student_id: StudentId,
    pub period: EvaluationPeriod,
    pub kind: CalculationKind,
    /// Serialized calculator result (`SapResult` or `GpaResult`).
    pub result: serde_json::Value,
    /// Batch run that produced this record, when batch-produced.
    pub run_id: Option<BatchRunId>,
    pub computed_at: DateTime<Utc>,
}

impl EvaluationRecord {
    /// The idempotency key the sink upserts on.
    pub fn natural_key(&self) -> (String, String, &'static str) {
        (
            self.student_id.0.clone(),
            self.period.0.clone(),
            self.kind.as_str(),
        )
    }
}
