//! Satisfactory Academic Progress evaluation.
//!
//! Three components (cumulative GPA, completion pace, maximum timeframe)
//! are evaluated independently against a [`SapPolicy`], then a standing is
//! derived with a fixed precedence:
//!
//! 1. max-timeframe exceeded (or a prior `ineligible` standing) → `ineligible`
//! 2. GPA and pace both met → `satisfactory`
//! 3. previously `satisfactory` or first evaluation → `warning`
//! 4. approved appeal → `probation`, or `academic_plan` when a plan is on file
//! 5. otherwise → `suspension`
//!
//! Academic-plan term requirements are reported alongside but never
//! override the standing derivation.

use serde::{Deserialize, Serialize};

use campanile_records::{AcademicSnapshot, SapStatus};

use crate::error::ValidationError;
use crate::gpa::GpaResult;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// GPA requirement for one attempted-credit band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpaTier {
    /// Inclusive lower bound of the band, in attempted credits.
    pub min_credits: f64,
    /// Exclusive upper bound; `None` means unbounded.
    pub max_credits: Option<f64>,
    pub required_gpa: f64,
}

impl GpaTier {
    fn matches(&self, attempted: f64) -> bool {
        attempted >= self.min_credits && self.max_credits.map_or(true, |max| attempted < max)
    }
}

/// How often the institution evaluates SAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationCadence {
    Term,
    PaymentPeriod,
    Annual,
}

/// Term requirements attached to an academic plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTerms {
    pub minimum_term_gpa: Option<f64>,
    pub minimum_term_credits: Option<f64>,
}

/// Institution/program SAP policy. Immutable configuration injected per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SapPolicy {
    pub minimum_gpa: f64,
    /// Minimum completion pace (earned ÷ attempted credits).
    pub minimum_pace: f64,
    /// Multiplier on program credits for the maximum-timeframe cap.
    pub max_timeframe_percentage: f64,
    /// Tiered GPA requirements by attempted-credit band. First match wins;
    /// falls back to `minimum_gpa` when no tier matches.
    pub gpa_requirements_by_credits: Vec<GpaTier>,
    pub cadence: EvaluationCadence,
    /// Term requirements checked while a student is on an academic plan.
    pub academic_plan: Option<PlanTerms>,
}

impl SapPolicy {
    /// Federal-baseline policy: 2.0 GPA (1.75 under 30 attempted credits),
    /// 67% pace, 150% maximum timeframe, evaluated per term.
    pub fn standard() -> Self {
        Self {
            minimum_gpa: 2.0,
            minimum_pace: 0.67,
            max_timeframe_percentage: 1.5,
            gpa_requirements_by_credits: vec![GpaTier {
                min_credits: 0.0,
                max_credits: Some(30.0),
                required_gpa: 1.75,
            }],
            cadence: EvaluationCadence::Term,
            academic_plan: Some(PlanTerms {
                minimum_term_gpa: Some(2.0),
                minimum_term_credits: Some(6.0),
            }),
        }
    }

    /// The GPA requirement applying at the given attempted-credit total.
    pub fn required_gpa(&self, attempted_credits: f64) -> f64 {
        self.gpa_requirements_by_credits
            .iter()
            .find(|tier| tier.matches(attempted_credits))
            .map(|tier| tier.required_gpa)
            .unwrap_or(self.minimum_gpa)
    }

    /// Maximum attempted credits before timeframe eligibility ends.
    pub fn allowed_credits(&self, program_credits: f64) -> f64 {
        program_credits * self.max_timeframe_percentage
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One student's snapshot, reduced to what SAP evaluation needs.
///
/// The caller is responsible for an accurate `previous_status`; `None` is
/// treated as a first evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SapInput {
    pub cumulative_gpa: Option<f64>,
    pub attempted_credits: f64,
    pub earned_credits: f64,
    pub program_credits: f64,
    pub previous_status: Option<SapStatus>,
    pub appeal_approved: bool,
    pub on_academic_plan: bool,
    pub term_gpa: Option<f64>,
    pub term_earned_credits: Option<f64>,
}

impl SapInput {
    /// Build the SAP input from an academic snapshot and its GPA result.
    pub fn from_snapshot(snapshot: &AcademicSnapshot, gpa: &GpaResult) -> Self {
        Self {
            cumulative_gpa: gpa.cumulative_gpa,
            attempted_credits: gpa.attempted_credits,
            earned_credits: gpa.earned_credits,
            program_credits: snapshot.program_credits,
            previous_status: snapshot.previous_sap_status,
            appeal_approved: snapshot.appeal_approved,
            on_academic_plan: snapshot.on_academic_plan,
            term_gpa: snapshot.term_gpa,
            term_earned_credits: snapshot.term_earned_credits,
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// GPA component outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpaComponent {
    pub required: f64,
    pub actual: Option<f64>,
    pub met: bool,
    /// `required − actual` when unmet (a missing GPA counts as zero).
    pub deficit: Option<f64>,
}

/// Completion-pace component outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceComponent {
    pub required: f64,
    /// Earned ÷ attempted credits; zero when nothing was attempted.
    pub actual: f64,
    pub met: bool,
}

/// Maximum-timeframe component outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeComponent {
    pub allowed_credits: f64,
    pub attempted_credits: f64,
    pub exceeded: bool,
}

/// Academic-plan term compliance, reported when the student is on a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCompliance {
    pub compliant: bool,
    pub notes: Vec<String>,
}

/// Outcome of one SAP evaluation cycle.
///
/// Stored as a new versioned record per cycle; never overwritten in place
/// within a period's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SapResult {
    pub status: SapStatus,
    pub eligible_for_aid: bool,
    pub gpa: GpaComponent,
    pub pace: PaceComponent,
    pub timeframe: TimeframeComponent,
    pub academic_plan_compliance: Option<PlanCompliance>,
    /// Human-readable guidance keyed off the failed components.
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate Satisfactory Academic Progress for one student.
///
/// Deterministic and side-effect free.
///
/// # Errors
///
/// Returns a `ValidationError` for negative credit totals, a non-positive
/// program length, or a non-positive timeframe percentage.
pub fn evaluate_sap(input: &SapInput, policy: &SapPolicy) -> Result<SapResult, ValidationError> {
    if input.attempted_credits < 0.0 {
        return Err(ValidationError::NegativeCreditTotal {
            field: "attempted_credits".to_string(),
            value: input.attempted_credits,
        });
    }
    if input.earned_credits < 0.0 {
        return Err(ValidationError::NegativeCreditTotal {
            field: "earned_credits".to_string(),
            value: input.earned_credits,
        });
    }
    if input.program_credits <= 0.0 {
        return Err(ValidationError::NonPositiveProgramCredits {
            credits: input.program_credits,
        });
    }
    if policy.max_timeframe_percentage <= 0.0 {
        return Err(ValidationError::InvalidPolicy(format!(
            "max timeframe percentage must be positive, got {}",
            policy.max_timeframe_percentage
        )));
    }

    let gpa = gpa_component(input, policy);
    let pace = pace_component(input, policy);
    let timeframe = timeframe_component(input, policy);

    let status = derive_status(input, &gpa, &pace, &timeframe);

    let academic_plan_compliance = if input.on_academic_plan {
        policy
            .academic_plan
            .as_ref()
            .map(|terms| plan_compliance(input, terms))
    } else {
        None
    };

    let recommendations = recommendations(&gpa, &pace, &timeframe, status);

    Ok(SapResult {
        status,
        eligible_for_aid: status.eligible_for_aid(),
        gpa,
        pace,
        timeframe,
        academic_plan_compliance,
        recommendations,
    })
}

fn gpa_component(input: &SapInput, policy: &SapPolicy) -> GpaComponent {
    let required = policy.required_gpa(input.attempted_credits);
    let met = input.cumulative_gpa.map_or(false, |gpa| gpa >= required);
    let deficit = if met {
        None
    } else {
        Some(required - input.cumulative_gpa.unwrap_or(0.0))
    };
    GpaComponent {
        required,
        actual: input.cumulative_gpa,
        met,
        deficit,
    }
}

fn pace_component(input: &SapInput, policy: &SapPolicy) -> PaceComponent {
    // Zero attempted credits is unmet, not a division error.
    let actual = if input.attempted_credits > 0.0 {
        input.earned_credits / input.attempted_credits
    } else {
        0.0
    };
    let met = input.attempted_credits > 0.0 && actual >= policy.minimum_pace;
    PaceComponent {
        required: policy.minimum_pace,
        actual,
        met,
    }
}

fn timeframe_component(input: &SapInput, policy: &SapPolicy) -> TimeframeComponent {
    let allowed_credits = policy.allowed_credits(input.program_credits);
    TimeframeComponent {
        allowed_credits,
        attempted_credits: input.attempted_credits,
        exceeded: input.attempted_credits >= allowed_credits,
    }
}

/// Fixed-precedence standing derivation; first match wins.
fn derive_status(
    input: &SapInput,
    gpa: &GpaComponent,
    pace: &PaceComponent,
    timeframe: &TimeframeComponent,
) -> SapStatus {
    if timeframe.exceeded || input.previous_status == Some(SapStatus::Ineligible) {
        return SapStatus::Ineligible;
    }
    if gpa.met && pace.met {
        return SapStatus::Satisfactory;
    }
    if matches!(input.previous_status, None | Some(SapStatus::Satisfactory)) {
        return SapStatus::Warning;
    }
    if input.appeal_approved {
        return if input.on_academic_plan {
            SapStatus::AcademicPlan
        } else {
            SapStatus::Probation
        };
    }
    SapStatus::Suspension
}

fn plan_compliance(input: &SapInput, terms: &PlanTerms) -> PlanCompliance {
    let mut notes = Vec::new();
    let mut compliant = true;

    if let Some(required) = terms.minimum_term_gpa {
        match input.term_gpa {
            Some(actual) if actual >= required => {}
            Some(actual) => {
                compliant = false;
                notes.push(format!(
                    "term GPA {actual:.2} below plan minimum {required:.2}"
                ));
            }
            None => {
                compliant = false;
                notes.push(format!(
                    "term GPA not reported; plan requires {required:.2}"
                ));
            }
        }
    }
    if let Some(required) = terms.minimum_term_credits {
        match input.term_earned_credits {
            Some(actual) if actual >= required => {}
            Some(actual) => {
                compliant = false;
                notes.push(format!(
                    "term credits {actual:.1} below plan minimum {required:.1}"
                ));
            }
            None => {
                compliant = false;
                notes.push(format!(
                    "term credits not reported; plan requires {required:.1}"
                ));
            }
        }
    }

    PlanCompliance { compliant, notes }
}

fn recommendations(
    gpa: &GpaComponent,
    pace: &PaceComponent,
    timeframe: &TimeframeComponent,
    status: SapStatus,
) -> Vec<String> {
    let mut out = Vec::new();
    if timeframe.exceeded {
        out.push(format!(
            "Attempted credits ({:.1}) meet or exceed the maximum timeframe of {:.1}; aid eligibility for this program has ended.",
            timeframe.attempted_credits, timeframe.allowed_credits
        ));
        return out;
    }
    if !gpa.met {
        out.push(format!(
            "Raise the cumulative GPA by {:.2} points to meet the {:.2} requirement.",
            gpa.deficit.unwrap_or(0.0),
            gpa.required
        ));
    }
    if !pace.met {
        out.push(format!(
            "Complete a larger share of attempted credits; pace {:.2} is below the required {:.2}.",
            pace.actual, pace.required
        ));
    }
    if status == SapStatus::Warning {
        out.push(
            "Aid continues for one warning period; all standards must be met at the next evaluation.".to_string(),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(gpa: Option<f64>, attempted: f64, earned: f64) -> SapInput {
        SapInput {
            cumulative_gpa: gpa,
            attempted_credits: attempted,
            earned_credits: earned,
            program_credits: 120.0,
            previous_status: None,
            appeal_approved: false,
            on_academic_plan: false,
            term_gpa: None,
            term_earned_credits: None,
        }
    }

    fn flat_policy() -> SapPolicy {
        SapPolicy {
            gpa_requirements_by_credits: Vec::new(),
            academic_plan: None,
            ..SapPolicy::standard()
        }
    }

    #[test]
    fn test_all_components_met_is_satisfactory() {
        let result = evaluate_sap(&input(Some(3.2), 60.0, 54.0), &flat_policy()).unwrap();
        assert_eq!(result.status, SapStatus::Satisfactory);
        assert!(result.eligible_for_aid);
        assert!(result.gpa.met && result.pace.met);
        assert!(!result.timeframe.exceeded);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_first_evaluation_deficit_is_warning() {
        // GPA 1.8 vs 2.0, pace 40/60, timeframe 60 < 180.
        let result = evaluate_sap(&input(Some(1.8), 60.0, 40.0), &flat_policy()).unwrap();
        assert_eq!(result.status, SapStatus::Warning);
        assert!(result.eligible_for_aid);
        assert!(!result.gpa.met);
        assert_eq!(result.gpa.deficit, Some(2.0 - 1.8));
        assert!(!result.timeframe.exceeded);
    }

    #[test]
    fn test_pace_boundary_met_at_exact_minimum() {
        // 67/100 == 0.67 meets a 0.67 requirement.
        let result = evaluate_sap(&input(Some(3.0), 100.0, 67.0), &flat_policy()).unwrap();
        assert!(result.pace.met);
        assert_eq!(result.status, SapStatus::Satisfactory);
    }

    #[test]
    fn test_pace_just_under_minimum_is_unmet() {
        // 40/60 = 0.666… falls short of 0.67.
        let result = evaluate_sap(&input(Some(3.0), 60.0, 40.0), &flat_policy()).unwrap();
        assert!(!result.pace.met);
        assert_eq!(result.status, SapStatus::Warning);
    }

    #[test]
    fn test_zero_attempted_credits_is_unmet_pace() {
        let result = evaluate_sap(&input(None, 0.0, 0.0), &flat_policy()).unwrap();
        assert_eq!(result.pace.actual, 0.0);
        assert!(!result.pace.met);
        assert!(!result.timeframe.exceeded);
        assert_eq!(result.status, SapStatus::Warning);
    }

    #[test]
    fn test_timeframe_exceedance_forces_ineligible() {
        // 190 ≥ 120 × 1.5 = 180, GPA and pace otherwise satisfactory.
        let result = evaluate_sap(&input(Some(3.8), 190.0, 185.0), &flat_policy()).unwrap();
        assert!(result.timeframe.exceeded);
        assert_eq!(result.timeframe.allowed_credits, 180.0);
        assert_eq!(result.status, SapStatus::Ineligible);
        assert!(!result.eligible_for_aid);
    }

    #[test]
    fn test_timeframe_boundary_is_exceeded() {
        let result = evaluate_sap(&input(Some(3.8), 180.0, 175.0), &flat_policy()).unwrap();
        assert!(result.timeframe.exceeded);
        assert_eq!(result.status, SapStatus::Ineligible);
    }

    #[test]
    fn test_previous_ineligible_stays_ineligible() {
        let mut sap_input = input(Some(3.8), 60.0, 58.0);
        sap_input.previous_status = Some(SapStatus::Ineligible);
        let result = evaluate_sap(&sap_input, &flat_policy()).unwrap();
        assert_eq!(result.status, SapStatus::Ineligible);
    }

    #[test]
    fn test_repeat_deficiency_without_appeal_is_suspension() {
        let mut sap_input = input(Some(1.5), 60.0, 30.0);
        sap_input.previous_status = Some(SapStatus::Warning);
        let result = evaluate_sap(&sap_input, &flat_policy()).unwrap();
        assert_eq!(result.status, SapStatus::Suspension);
        assert!(!result.eligible_for_aid);
    }

    #[test]
    fn test_approved_appeal_grants_probation() {
        let mut sap_input = input(Some(1.5), 60.0, 30.0);
        sap_input.previous_status = Some(SapStatus::Warning);
        sap_input.appeal_approved = true;
        let result = evaluate_sap(&sap_input, &flat_policy()).unwrap();
        assert_eq!(result.status, SapStatus::Probation);
        assert!(result.eligible_for_aid);
    }

    #[test]
    fn test_appeal_with_plan_grants_academic_plan() {
        let mut sap_input = input(Some(1.5), 60.0, 30.0);
        sap_input.previous_status = Some(SapStatus::Probation);
        sap_input.appeal_approved = true;
        sap_input.on_academic_plan = true;
        let result = evaluate_sap(&sap_input, &flat_policy()).unwrap();
        assert_eq!(result.status, SapStatus::AcademicPlan);
    }

    #[test]
    fn test_aid_eligibility_matches_status_exactly() {
        // eligible_for_aid is false iff suspension or ineligible.
        let cases = [
            (SapStatus::Satisfactory, true),
            (SapStatus::Warning, true),
            (SapStatus::Probation, true),
            (SapStatus::AcademicPlan, true),
            (SapStatus::Suspension, false),
            (SapStatus::Ineligible, false),
        ];
        for (status, expected) in cases {
            assert_eq!(status.eligible_for_aid(), expected, "{status}");
        }
    }

    #[test]
    fn test_tiered_gpa_requirement_applies_by_credit_band() {
        let policy = SapPolicy::standard();
        assert_eq!(policy.required_gpa(15.0), 1.75);
        assert_eq!(policy.required_gpa(30.0), 2.0);
        assert_eq!(policy.required_gpa(90.0), 2.0);

        // 1.8 meets the 1.75 tier under 30 credits.
        let result = evaluate_sap(&input(Some(1.8), 15.0, 12.0), &policy).unwrap();
        assert!(result.gpa.met);
        assert_eq!(result.gpa.required, 1.75);
    }

    #[test]
    fn test_plan_compliance_reported_but_never_overrides_status() {
        let mut sap_input = input(Some(3.0), 60.0, 54.0);
        sap_input.on_academic_plan = true;
        sap_input.term_gpa = Some(1.0);
        sap_input.term_earned_credits = Some(3.0);

        let result = evaluate_sap(&sap_input, &SapPolicy::standard()).unwrap();
        // Components met → satisfactory even though the plan terms are missed.
        assert_eq!(result.status, SapStatus::Satisfactory);
        let compliance = result.academic_plan_compliance.unwrap();
        assert!(!compliance.compliant);
        assert_eq!(compliance.notes.len(), 2);
    }

    #[test]
    fn test_missing_plan_measurements_are_noncompliant() {
        let mut sap_input = input(Some(1.5), 60.0, 30.0);
        sap_input.previous_status = Some(SapStatus::Warning);
        sap_input.appeal_approved = true;
        sap_input.on_academic_plan = true;

        let result = evaluate_sap(&sap_input, &SapPolicy::standard()).unwrap();
        let compliance = result.academic_plan_compliance.unwrap();
        assert!(!compliance.compliant);
        assert!(compliance.notes.iter().any(|n| n.contains("not reported")));
    }

    #[test]
    fn test_recommendations_keyed_off_failed_components() {
        let result = evaluate_sap(&input(Some(1.8), 60.0, 40.0), &flat_policy()).unwrap();
        assert!(result.recommendations.iter().any(|r| r.contains("GPA")));
        assert!(result.recommendations.iter().any(|r| r.contains("pace")));
    }

    #[test]
    fn test_negative_totals_rejected() {
        let err = evaluate_sap(&input(Some(2.0), -1.0, 0.0), &flat_policy()).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeCreditTotal { .. }));

        let mut bad = input(Some(2.0), 10.0, 5.0);
        bad.program_credits = 0.0;
        let err = evaluate_sap(&bad, &flat_policy()).unwrap_err();
        assert!(matches!(err, ValidationError::NonPositiveProgramCredits { .. }));
    }
}
