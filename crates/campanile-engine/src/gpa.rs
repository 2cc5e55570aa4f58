//! Cumulative GPA calculation with repeat-course resolution.
//!
//! Pure function of an ordered attempt list and a [`GpaConfig`]. Produces a
//! [`GpaResult`] whose `details` record, for every attempt, whether it
//! contributed to the aggregate and why it was excluded if not.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use campanile_records::{CourseAttempt, RepeatPolicy};

use crate::error::ValidationError;

/// Configuration for GPA calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpaConfig {
    /// Repeat policy applied to a course whose attempts carry none.
    ///
    /// Defaults to `all_count`: deduplication changes aid math, so it only
    /// happens when catalog or institutional policy opts in explicitly.
    pub default_repeat_policy: RepeatPolicy,
    /// Decimal places the cumulative GPA is rounded to.
    pub precision: u32,
}

impl Default for GpaConfig {
    fn default() -> Self {
        Self {
            default_repeat_policy: RepeatPolicy::AllCount,
            precision: 3,
        }
    }
}

/// Why an attempt was excluded from the aggregate totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcludedReason {
    /// A more recent attempt replaced this one under the `replace` policy.
    ReplacedByLaterAttempt,
    /// A better-graded attempt superseded this one under the `highest` policy.
    SupersededByBestAttempt,
}

impl std::fmt::Display for ExcludedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReplacedByLaterAttempt => write!(f, "replaced by a later attempt"),
            Self::SupersededByBestAttempt => write!(f, "superseded by the best-graded attempt"),
        }
    }
}

/// Audit entry for one attempt's contribution to the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptDetail {
    pub attempt_id: String,
    pub course_id: String,
    pub term_id: String,
    pub credits: f64,
    pub grade: Option<String>,
    pub grade_points: Option<f64>,
    /// Whether the attempt contributed to any aggregate total.
    pub included: bool,
    pub excluded_reason: Option<ExcludedReason>,
}

/// Aggregate GPA result. Produced fresh on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpaResult {
    pub attempted_credits: f64,
    pub earned_credits: f64,
    pub quality_points: f64,
    /// Attempted credits in the GPA denominator (GPA-eligible subset).
    pub gpa_credits: f64,
    /// `None` exactly when `gpa_credits` is zero.
    pub cumulative_gpa: Option<f64>,
    /// Per-attempt audit trail, in input order.
    pub details: Vec<AttemptDetail>,
}

/// Calculate the cumulative GPA over an ordered attempt history.
///
/// Attempts must be in chronological order; repeat resolution for the
/// `replace` policy keeps the most recent attempt of each course.
///
/// # Errors
///
/// Returns `ValidationError::NegativeCredits` or
/// `ValidationError::GradePointsWithoutGrade` for malformed input. Nothing
/// is silently coerced.
pub fn calculate_gpa(
    attempts: &[CourseAttempt],
    config: &GpaConfig,
) -> Result<GpaResult, ValidationError> {
    for attempt in attempts {
        if attempt.credits < 0.0 {
            return Err(ValidationError::NegativeCredits {
                attempt_id: attempt.attempt_id.clone(),
                credits: attempt.credits,
            });
        }
        if attempt.grade_points.is_some() && attempt.grade.is_none() {
            return Err(ValidationError::GradePointsWithoutGrade {
                attempt_id: attempt.attempt_id.clone(),
            });
        }
    }

    let exclusions = resolve_repeats(attempts, config.default_repeat_policy);

    let mut attempted_credits = 0.0;
    let mut earned_credits = 0.0;
    let mut quality_points = 0.0;
    let mut gpa_credits = 0.0;
    let mut details = Vec::with_capacity(attempts.len());

    for (idx, attempt) in attempts.iter().enumerate() {
        let excluded_reason = exclusions[idx];
        let included = excluded_reason.is_none();

        if included {
            attempted_credits += attempt.credits;
            if attempt.earned {
                earned_credits += attempt.credits;
            }
            if attempt.include_in_gpa {
                if let Some(points) = attempt.grade_points {
                    quality_points += points * attempt.credits;
                    gpa_credits += attempt.credits;
                }
            }
        }

        details.push(AttemptDetail {
            attempt_id: attempt.attempt_id.clone(),
            course_id: attempt.course_id.clone(),
            term_id: attempt.term_id.clone(),
            credits: attempt.credits,
            grade: attempt.grade.clone(),
            grade_points: attempt.grade_points,
            included,
            excluded_reason,
        });
    }

    let cumulative_gpa = if gpa_credits > 0.0 {
        Some(round_to(quality_points / gpa_credits, config.precision))
    } else {
        None
    };

    Ok(GpaResult {
        attempted_credits,
        earned_credits,
        quality_points,
        gpa_credits,
        cumulative_gpa,
        details,
    })
}

/// Decide, per attempt, whether repeat resolution excludes it.
///
/// Returns a vector parallel to `attempts`; `Some(reason)` marks exclusion.
fn resolve_repeats(
    attempts: &[CourseAttempt],
    default_policy: RepeatPolicy,
) -> Vec<Option<ExcludedReason>> {
    let mut exclusions = vec![None; attempts.len()];

    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, attempt) in attempts.iter().enumerate() {
        groups.entry(attempt.course_id.as_str()).or_default().push(idx);
    }

    for indices in groups.values() {
        if indices.len() < 2 {
            continue;
        }
        let policy = indices
            .iter()
            .find_map(|&idx| attempts[idx].repeat_policy)
            .unwrap_or(default_policy);

        match policy {
            RepeatPolicy::Replace => {
                // Input order is chronological, so the last index is the
                // most recent attempt.
                for &idx in &indices[..indices.len() - 1] {
                    exclusions[idx] = Some(ExcludedReason::ReplacedByLaterAttempt);
                }
            }
            RepeatPolicy::Highest => {
                let best = indices.iter().copied().max_by(|&a, &b| {
                    let pa = attempts[a].grade_points.unwrap_or(f64::NEG_INFINITY);
                    let pb = attempts[b].grade_points.unwrap_or(f64::NEG_INFINITY);
                    pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
                });
                if let Some(best) = best {
                    for &idx in indices {
                        if idx != best {
                            exclusions[idx] = Some(ExcludedReason::SupersededByBestAttempt);
                        }
                    }
                }
            }
            // Every attempt contributes; the credit-weighted mean falls out
            // of the quality-point and credit sums.
            RepeatPolicy::Average | RepeatPolicy::AllCount => {}
        }
    }

    exclusions
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
