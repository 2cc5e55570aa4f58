//! Error types for campanile-records

use thiserror::Error;

/// Errors that can occur at the record-access and persistence seams
#[derive(Error, Debug)]
pub enum RecordsError {
    /// No academic snapshot exists for the student
    #[error("snapshot not found for student {student_id}")]
    SnapshotNotFound { student_id: String },

    /// Record lookup or cohort query failed
    #[error("records query failed: {0}")]
    Query(String),

    /// An upsert lost a write race it could not resolve
    #[error("write conflict on {key}: {detail}")]
    Conflict { key: String, detail: String },

    /// Result payload could not be serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for record-seam operations
pub type RecordsResult<T> = std::result::Result<T, RecordsError>;
