//! Durable key-value storage
//!
//! Progress is persisted as JSON values under flat string keys, namespaced
//! per course and per concern (`course-<id>-progress`, `course-<id>-notes`, ...).

pub mod file;
pub mod memory;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, TrackerError};

// Re-exports
pub use file::FileStore;
pub use memory::MemoryStore;

static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Minimal durable store contract
pub trait KeyValueStore {
    /// Read the value stored under `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrite the value stored under `key`
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }
}

/// What a course-scoped key holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concern {
    Progress,
    QuizScores,
    TimeSpent,
    Notes,
    Discussions,
    Achievements,
}

impl Concern {
    /// Key suffix for this concern
    pub fn suffix(self) -> &'static str {
        match self {
            Concern::Progress => "progress",
            Concern::QuizScores => "quiz-scores",
            Concern::TimeSpent => "time-spent",
            Concern::Notes => "notes",
            Concern::Discussions => "discussions",
            Concern::Achievements => "achievements",
        }
    }
}

/// Build the store key for a course and concern
pub fn course_key(course_id: &str, concern: Concern) -> String {
    format!("course-{}-{}", course_id, concern.suffix())
}

/// Reject keys that could escape a flat namespace
pub fn validate_key(key: &str) -> Result<()> {
    if KEY_RE.is_match(key) { Ok(()) } else { Err(TrackerError::InvalidKey(key.to_string())) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_keys_are_namespaced() {
        assert_eq!(course_key("safety", Concern::Progress), "course-safety-progress");
        assert_eq!(course_key("safety", Concern::QuizScores), "course-safety-quiz-scores");
        assert_eq!(course_key("7", Concern::TimeSpent), "course-7-time-spent");
        assert_eq!(course_key("7", Concern::Achievements), "course-7-achievements");
    }

    #[test]
    fn valid_keys_pass() {
        assert!(validate_key("course-safety_101-notes").is_ok());
    }

    #[test]
    fn path_like_keys_are_rejected() {
        assert!(matches!(validate_key("../etc/passwd"), Err(TrackerError::InvalidKey(_))));
        assert!(matches!(validate_key("a/b"), Err(TrackerError::InvalidKey(_))));
        assert!(matches!(validate_key(""), Err(TrackerError::InvalidKey(_))));
    }
}
