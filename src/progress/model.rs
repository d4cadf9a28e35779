//! Per-module progress records and course state

use serde::{Deserialize, Serialize};

use super::achievements::AchievementSet;
use crate::catalog::Course;
use crate::error::{Result, TrackerError};

/// Progress data for a single module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleProgressRecord {
    /// Module id (`module-<n>`); the persisted map key, not a stored field
    #[serde(skip)]
    pub module_id: String,

    /// Has the module been completed (manually or by passing its quiz)?
    pub completed: bool,

    /// Last submitted quiz score (0-100)
    pub quiz_score: u8,

    /// Number of quiz submissions; zero means the score is not counted
    pub quiz_attempts: u32,

    /// Minutes attributed to this module, never decreases
    pub time_spent_minutes: u32,

    /// Learner notes, last write wins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ModuleProgressRecord {
    /// Zero-valued record for a module
    pub fn new(module_id: impl Into<String>) -> Self {
        Self { module_id: module_id.into(), ..Default::default() }
    }

    /// Whether at least one quiz has been submitted
    pub fn has_quiz_score(&self) -> bool {
        self.quiz_attempts > 0
    }
}

/// Full progress state for one course
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseState {
    /// Course identifier
    pub course_id: String,

    /// One record per curriculum module, in curriculum order
    pub modules: Vec<ModuleProgressRecord>,

    /// Unlocked badges
    pub achievements: AchievementSet,
}

impl CourseState {
    /// Fresh state with a zero-valued record for every curriculum module
    pub fn new(course: &Course) -> Self {
        Self {
            course_id: course.id.clone(),
            modules: course.module_ids().map(ModuleProgressRecord::new).collect(),
            achievements: AchievementSet::default(),
        }
    }

    /// Look up a module record
    pub fn module(&self, module_id: &str) -> Option<&ModuleProgressRecord> {
        self.modules.iter().find(|m| m.module_id == module_id)
    }

    /// Look up a module record, failing for modules outside the curriculum
    pub fn module_mut(&mut self, module_id: &str) -> Result<&mut ModuleProgressRecord> {
        let course_id = &self.course_id;
        self.modules.iter_mut().find(|m| m.module_id == module_id).ok_or_else(|| {
            TrackerError::UnknownModule {
                course_id: course_id.clone(),
                module_id: module_id.to_string(),
            }
        })
    }

    /// Explicitly mark a module complete or incomplete
    pub fn set_completion(&mut self, module_id: &str, completed: bool) -> Result<()> {
        self.module_mut(module_id)?.completed = completed;
        Ok(())
    }

    /// Record a quiz submission; a passing score completes the module
    ///
    /// Completion only ratchets upward here: a later failing score leaves a
    /// completed module completed.
    pub fn record_quiz_score(&mut self, module_id: &str, score: i32, passing_score: u8) -> Result<()> {
        let score = validate_score(score)?;
        let record = self.module_mut(module_id)?;
        record.quiz_score = score;
        record.quiz_attempts = record.quiz_attempts.saturating_add(1);
        if score >= passing_score {
            record.completed = true;
        }
        Ok(())
    }

    /// Attribute additional minutes to a module
    pub fn add_time_spent(&mut self, module_id: &str, minutes: i64) -> Result<()> {
        let minutes = validate_time_delta(minutes)?;
        let record = self.module_mut(module_id)?;
        record.time_spent_minutes = record.time_spent_minutes.saturating_add(minutes);
        Ok(())
    }

    /// Replace a module's notes; blank text clears them
    pub fn set_note(&mut self, module_id: &str, text: &str) -> Result<()> {
        let record = self.module_mut(module_id)?;
        record.notes = if text.trim().is_empty() { None } else { Some(text.to_string()) };
        Ok(())
    }
}

/// Check a quiz score is within 0-100
pub fn validate_score(score: i32) -> Result<u8> {
    u8::try_from(score).ok().filter(|s| *s <= 100).ok_or(TrackerError::InvalidScore(score))
}

/// Check a time delta is non-negative and fits a counter
pub fn validate_time_delta(minutes: i64) -> Result<u32> {
    u32::try_from(minutes).map_err(|_| TrackerError::InvalidTimeDelta(minutes))
}
