//! Graduation eligibility validation.
//!
//! Evaluates three independent checklists (academic, administrative,
//! record-data) against a [`GraduationPolicy`] and aggregates them into a
//! single verdict with ordered blockers and warnings. The validator is a
//! pure aggregation: holds, balances, and clearance flags arrive
//! pre-resolved in the input.

use serde::{Deserialize, Serialize};

use crate::honors::{evaluate_honors, LatinHonorsConfig, LatinHonorsInput, LatinHonorsResult};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Institution graduation policy. Immutable configuration injected per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraduationPolicy {
    pub minimum_credits: f64,
    pub minimum_gpa: f64,
    /// Largest outstanding balance that does not block conferral.
    pub max_financial_balance: f64,
    pub require_exit_counseling: bool,
}

impl GraduationPolicy {
    /// Baseline policy: 120 credits, 2.0 GPA, zero balance tolerance,
    /// exit counseling required.
    pub fn standard() -> Self {
        Self {
            minimum_credits: 120.0,
            minimum_gpa: 2.0,
            max_financial_balance: 0.0,
            require_exit_counseling: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A registrar hold on the student's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrarHold {
    pub code: String,
    /// Whether the hold category blocks graduation.
    pub blocks_graduation: bool,
}

/// Academic-side standing, pre-resolved by the degree-audit collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicStanding {
    pub degree_audit_complete: bool,
    pub credits_earned: f64,
    pub cumulative_gpa: Option<f64>,
    /// Count of incomplete or pending grades still on the transcript.
    pub incomplete_or_pending_grades: u32,
    pub required_milestones: Vec<String>,
    pub completed_milestones: Vec<String>,
    /// Non-required milestones the program recommends.
    pub recommended_milestones: Vec<String>,
}

/// Administrative clearance state, pre-resolved by the bursar/registrar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdministrativeStanding {
    pub holds: Vec<RegistrarHold>,
    pub financial_balance: f64,
    pub library_cleared: bool,
    pub department_cleared: bool,
    pub exit_counseling_complete: bool,
    pub international: bool,
    /// SEVIS record updated; only checked for international students.
    pub sevis_updated: bool,
}

/// Completeness of the student record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCompleteness {
    pub diploma_name: Option<String>,
    pub mailing_address: Option<String>,
    pub program_declared: bool,
    pub major_declared: bool,
}

/// Full input to one eligibility validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraduationEligibilityInput {
    pub academic: AcademicStanding,
    pub administrative: AdministrativeStanding,
    pub record: RecordCompleteness,
    /// Present on the conferral path; honors are computed and embedded
    /// when a config is also supplied.
    pub honors: Option<LatinHonorsInput>,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Which checklist a blocker came from. Blockers are ordered academic →
/// administrative → record-data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistCategory {
    Academic,
    Administrative,
    RecordData,
}

impl std::fmt::Display for ChecklistCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Academic => write!(f, "academic"),
            Self::Administrative => write!(f, "administrative"),
            Self::RecordData => write!(f, "record_data"),
        }
    }
}

/// One failing condition that prevents conferral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blocker {
    pub category: ChecklistCategory,
    pub reason: String,
}

/// The outcome of a graduation eligibility validation. Read-mostly once
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraduationValidationResult {
    /// True only when every checklist passes.
    pub is_eligible: bool,
    /// Failing conditions, ordered academic → administrative → record-data.
    pub blockers: Vec<Blocker>,
    /// Non-fatal conditions worth surfacing.
    pub warnings: Vec<String>,
    /// Latin honors, when evaluated on the conferral path.
    pub honors: Option<LatinHonorsResult>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate graduation eligibility for one student.
///
/// The honors result is embedded when both the input's honors section and
/// an honors config are supplied.
pub fn validate_graduation(
    input: &GraduationEligibilityInput,
    policy: &GraduationPolicy,
    honors_config: Option<&LatinHonorsConfig>,
) -> GraduationValidationResult {
    let mut blockers = Vec::new();
    let mut warnings = Vec::new();

    check_academic(&input.academic, policy, &mut blockers, &mut warnings);
    check_administrative(&input.administrative, policy, &mut blockers, &mut warnings);
    check_record(&input.record, &mut blockers);

    let honors = match (&input.honors, honors_config) {
        (Some(honors_input), Some(config)) => Some(evaluate_honors(honors_input, config)),
        _ => None,
    };

    GraduationValidationResult {
        is_eligible: blockers.is_empty(),
        blockers,
        warnings,
        honors,
    }
}

fn check_academic(
    academic: &AcademicStanding,
    policy: &GraduationPolicy,
    blockers: &mut Vec<Blocker>,
    warnings: &mut Vec<String>,
) {
    let mut block = |reason: String| {
        blockers.push(Blocker {
            category: ChecklistCategory::Academic,
            reason,
        });
    };

    if !academic.degree_audit_complete {
        block("degree audit is not complete".to_string());
    }
    if academic.credits_earned < policy.minimum_credits {
        block(format!(
            "earned credits {:.1} below the {:.1} required",
            academic.credits_earned, policy.minimum_credits
        ));
    }
    match academic.cumulative_gpa {
        Some(gpa) if gpa >= policy.minimum_gpa => {}
        Some(gpa) => block(format!(
            "cumulative GPA {:.3} below the {:.2} required",
            gpa, policy.minimum_gpa
        )),
        None => block("no cumulative GPA on record".to_string()),
    }
    if academic.incomplete_or_pending_grades > 0 {
        block(format!(
            "{} incomplete or pending grade(s) on the transcript",
            academic.incomplete_or_pending_grades
        ));
    }
    for milestone in &academic.required_milestones {
        if !academic.completed_milestones.contains(milestone) {
            block(format!("required milestone not completed: {milestone}"));
        }
    }
    for milestone in &academic.recommended_milestones {
        if !academic.completed_milestones.contains(milestone) {
            warnings.push(format!("recommended milestone not completed: {milestone}"));
        }
    }
}

fn check_administrative(
    admin: &AdministrativeStanding,
    policy: &GraduationPolicy,
    blockers: &mut Vec<Blocker>,
    warnings: &mut Vec<String>,
) {
    let mut block = |reason: String| {
        blockers.push(Blocker {
            category: ChecklistCategory::Administrative,
            reason,
        });
    };

    for hold in &admin.holds {
        if hold.blocks_graduation {
            block(format!("blocking hold on account: {}", hold.code));
        } else {
            warnings.push(format!("non-blocking hold on account: {}", hold.code));
        }
    }
    if admin.financial_balance > policy.max_financial_balance {
        block(format!(
            "outstanding balance {:.2} exceeds the {:.2} allowed",
            admin.financial_balance, policy.max_financial_balance
        ));
    }
    if !admin.library_cleared {
        block("library clearance outstanding".to_string());
    }
    if !admin.department_cleared {
        block("department clearance outstanding".to_string());
    }
    if policy.require_exit_counseling && !admin.exit_counseling_complete {
        block("exit counseling not completed".to_string());
    }
    if admin.international && !admin.sevis_updated {
        block("SEVIS record not updated".to_string());
    }
}

fn check_record(record: &RecordCompleteness, blockers: &mut Vec<Blocker>) {
    let mut block = |reason: &str| {
        blockers.push(Blocker {
            category: ChecklistCategory::RecordData,
            reason: reason.to_string(),
        });
    };

    if record.diploma_name.as_deref().map_or(true, str::is_empty) {
        block("diploma name missing");
    }
    if record.mailing_address.as_deref().map_or(true, str::is_empty) {
        block("mailing address missing");
    }
    if !record.program_declared {
        block("program declaration incomplete");
    }
    if !record.major_declared {
        block("major declaration incomplete");
    }
}
