//! Campanile Policy Engine
//!
//! Deterministic academic-progress and eligibility calculators plus the
//! batch orchestrator that runs them over student cohorts:
//!
//! - **GPA** — cumulative GPA with repeat-course resolution and a
//!   per-attempt audit trail.
//! - **SAP** — tri-component Satisfactory Academic Progress evaluation
//!   with a fixed status-derivation precedence.
//! - **Graduation** — three-checklist eligibility validation with ordered
//!   blockers and warnings.
//! - **Latin honors** — disqualification-first tier designation.
//! - **Batch** — sub-batched, settle-all cohort evaluation with idempotent
//!   persistence and progress reporting.
//!
//! Every calculator is a pure function of injected immutable policy values;
//! all I/O flows through the `campanile-records` collaborator traits.

pub mod batch;
pub mod error;
pub mod gpa;
pub mod graduation;
pub mod honors;
pub mod sap;
pub mod telemetry;

pub use campanile_records::{
    AcademicSnapshot, BatchRunId, CalculationKind, CourseAttempt, EvaluationPeriod,
    EvaluationRecord, EvaluationSink, GradeDefinition, GradeScale, ProgressSink, RecordStore,
    RecordsError, RepeatPolicy, SapStatus, StudentId,
};

pub use batch::{
    BatchConfig, BatchError, BatchProgress, BatchResult, BatchRunState, BatchRunner,
    CohortSelector, EvaluationPolicies,
};
pub use error::{EngineError, Result, ValidationError};
pub use gpa::{calculate_gpa, AttemptDetail, ExcludedReason, GpaConfig, GpaResult};
pub use graduation::{
    validate_graduation, AcademicStanding, AdministrativeStanding, Blocker, ChecklistCategory,
    GraduationEligibilityInput, GraduationPolicy, GraduationValidationResult, RecordCompleteness,
    RegistrarHold,
};
pub use honors::{
    evaluate_honors, HonorsDesignation, LatinHonorsConfig, LatinHonorsInput, LatinHonorsResult,
};
pub use sap::{
    evaluate_sap, EvaluationCadence, GpaComponent, GpaTier, PaceComponent, PlanCompliance,
    PlanTerms, SapInput, SapPolicy, SapResult, TimeframeComponent,
};
pub use telemetry::init_tracing;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
