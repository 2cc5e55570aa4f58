//! Latin honors designation.
//!
//! Pure function of a [`LatinHonorsInput`] and a [`LatinHonorsConfig`].
//! Disqualifying conditions are checked before any threshold comparison;
//! thresholds are evaluated top-down and the first satisfied tier wins.

use serde::{Deserialize, Serialize};

/// Honors tier, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HonorsDesignation {
    SummaCumLaude,
    MagnaCumLaude,
    CumLaude,
}

impl std::fmt::Display for HonorsDesignation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SummaCumLaude => write!(f, "summa cum laude"),
            Self::MagnaCumLaude => write!(f, "magna cum laude"),
            Self::CumLaude => write!(f, "cum laude"),
        }
    }
}

/// Institution honors configuration.
///
/// Thresholds must be supplied in descending order (summa ≥ magna ≥ cum);
/// the calculator evaluates them top-down and does not re-sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatinHonorsConfig {
    pub summa_threshold: f64,
    pub magna_threshold: f64,
    pub cum_threshold: f64,
    /// Minimum total credits for any designation.
    pub minimum_credits: f64,
    /// Minimum credits earned in residence for any designation.
    pub minimum_institutional_credits: f64,
    /// Use the institutional GPA instead of the cumulative GPA when set.
    pub exclude_transfer_credits: bool,
    /// Whether an academic-integrity violation disqualifies outright.
    pub disqualify_for_academic_integrity: bool,
}

impl LatinHonorsConfig {
    /// Common configuration: 3.9/3.7/3.5 cutoffs, 120 total and 60
    /// institutional credits, transfer work excluded, integrity
    /// disqualification enabled.
    pub fn standard() -> Self {
        Self {
            summa_threshold: 3.9,
            magna_threshold: 3.7,
            cum_threshold: 3.5,
            minimum_credits: 120.0,
            minimum_institutional_credits: 60.0,
            exclude_transfer_credits: true,
            disqualify_for_academic_integrity: true,
        }
    }
}

/// Per-student input to the honors calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatinHonorsInput {
    pub cumulative_gpa: f64,
    /// GPA over institutional coursework only, when tracked.
    pub institutional_gpa: Option<f64>,
    pub total_credits: f64,
    pub institutional_credits: f64,
    pub has_academic_integrity_violation: bool,
}

/// Computed designation, embedded in a graduation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatinHonorsResult {
    /// `None` whenever any disqualifying condition holds.
    pub designation: Option<HonorsDesignation>,
    pub disqualified_for_integrity: bool,
    /// The GPA the thresholds were compared against.
    pub gpa_used: f64,
    /// Always present: which threshold was met, or what disqualified.
    pub explanation: String,
}

/// Evaluate the Latin honors designation for one student.
pub fn evaluate_honors(input: &LatinHonorsInput, config: &LatinHonorsConfig) -> LatinHonorsResult {
    let gpa_used = if config.exclude_transfer_credits {
        input.institutional_gpa.unwrap_or(input.cumulative_gpa)
    } else {
        input.cumulative_gpa
    };

    if input.has_academic_integrity_violation && config.disqualify_for_academic_integrity {
        return LatinHonorsResult {
            designation: None,
            disqualified_for_integrity: true,
            gpa_used,
            explanation: "disqualified: academic integrity violation on record".to_string(),
        };
    }

    if input.total_credits < config.minimum_credits {
        return LatinHonorsResult {
            designation: None,
            disqualified_for_integrity: false,
            gpa_used,
            explanation: format!(
                "not eligible: {:.1} total credits below the {:.1} minimum",
                input.total_credits, config.minimum_credits
            ),
        };
    }

    if input.institutional_credits < config.minimum_institutional_credits {
        return LatinHonorsResult {
            designation: None,
            disqualified_for_integrity: false,
            gpa_used,
            explanation: format!(
                "not eligible: {:.1} institutional credits below the {:.1} minimum",
                input.institutional_credits, config.minimum_institutional_credits
            ),
        };
    }

    // Top-down; the caller supplies thresholds in descending order.
    let tiers = [
        (HonorsDesignation::SummaCumLaude, config.summa_threshold),
        (HonorsDesignation::MagnaCumLaude, config.magna_threshold),
        (HonorsDesignation::CumLaude, config.cum_threshold),
    ];
    for (designation, threshold) in tiers {
        if gpa_used >= threshold {
            return LatinHonorsResult {
                designation: Some(designation),
                disqualified_for_integrity: false,
                gpa_used,
                explanation: format!(
                    "{designation}: GPA {gpa_used:.3} meets the {threshold:.2} threshold"
                ),
            };
        }
    }

    LatinHonorsResult {
        designation: None,
        disqualified_for_integrity: false,
        gpa_used,
        explanation: format!(
            "no designation: GPA {gpa_used:.3} below the cum laude threshold {:.2}",
            config.cum_threshold
        ),
    }
}
