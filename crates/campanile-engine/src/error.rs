//! Error taxonomy for the policy engine.
//!
//! Three classes, handled differently by callers:
//! - `ValidationError`: malformed calculator input; must not be retried.
//! - `EngineError::MissingSnapshot`: data incompleteness; reported per
//!   entity in batch runs and the entity is skipped for the run.
//! - `EngineError::Records`: infrastructure failure; fails a whole run only
//!   during cohort retrieval, otherwise captured per entity.

/// Errors produced by calculator input validation.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("attempt {attempt_id} has negative credits: {credits}")]
    NegativeCredits { attempt_id: String, credits: f64 },

    #[error("attempt {attempt_id} carries grade points without a grade code")]
    GradePointsWithoutGrade { attempt_id: String },

    #[error("{field} must not be negative, got {value}")]
    NegativeCreditTotal { field: String, value: f64 },

    #[error("program credits must be positive, got {credits}")]
    NonPositiveProgramCredits { credits: f64 },

    #[error("invalid policy configuration: {0}")]
    InvalidPolicy(String),
}

/// Policy engine errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("academic snapshot missing for student {student_id}")]
    MissingSnapshot { student_id: String },

    #[error("records error: {0}")]
    Records(#[from] campanile_records::RecordsError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for policy engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::NegativeCredits {
            attempt_id: "A-1".to_string(),
            credits: -3.0,
        };
        assert!(err.to_string().contains("A-1"));
        assert!(err.to_string().contains("-3"));

        let err = ValidationError::GradePointsWithoutGrade {
            attempt_id: "A-2".to_string(),
        };
        assert!(err.to_string().contains("grade points without a grade code"));
    }

    #[test]
    fn test_engine_error_wraps_validation() {
        let err = EngineError::from(ValidationError::InvalidPolicy(
            "minimum pace out of range".to_string(),
        ));
        assert!(err.to_string().contains("validation error"));
        assert!(err.to_string().contains("minimum pace out of range"));
    }

    #[test]
    fn test_missing_snapshot_display() {
        let err = EngineError::MissingSnapshot {
            student_id: "S-42".to_string(),
        };
        assert!(err.to_string().contains("S-42"));
    }
}
