//! Error types for progress tracking

use thiserror::Error;

/// Errors that can occur while tracking course progress
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Quiz score outside 0-100
    #[error("Invalid quiz score {0}. Scores must be between 0 and 100")]
    InvalidScore(i32),

    /// Time can only be added, never removed
    #[error("Invalid time delta {0}. Time spent can only increase")]
    InvalidTimeDelta(i64),

    /// Module is not part of the course curriculum
    #[error("Module '{module_id}' is not part of course '{course_id}'")]
    UnknownModule {
        /// Course being tracked
        course_id: String,
        /// Module that was requested
        module_id: String,
    },

    /// Course is not in the catalog
    #[error("Course '{0}' not found in the catalog")]
    UnknownCourse(String),

    /// Reply target does not exist
    #[error("Discussion post '{0}' not found")]
    UnknownPost(String),

    /// Discussion content was empty
    #[error("Discussion posts cannot be empty")]
    EmptyPost,

    /// Store key contains characters outside [A-Za-z0-9_-]
    #[error("Invalid store key '{0}'")]
    InvalidKey(String),

    /// Certificate requested before every module is complete
    #[error("Course '{course_id}' is not complete ({completed}/{total} modules)")]
    NotEligible {
        /// Course the certificate was requested for
        course_id: String,
        /// Completed modules
        completed: usize,
        /// Modules in the curriculum
        total: usize,
    },

    /// Reading or writing the durable store failed
    #[error("Store I/O error for key '{key}': {source}")]
    Io {
        /// Key being read or written
        key: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackerError {
    /// Check if this error is a caller contract violation (bad input)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TrackerError::InvalidScore(_)
                | TrackerError::InvalidTimeDelta(_)
                | TrackerError::UnknownModule { .. }
                | TrackerError::UnknownPost(_)
                | TrackerError::EmptyPost
                | TrackerError::InvalidKey(_)
        )
    }
}

/// Result alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
