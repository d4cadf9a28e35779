//! Progress persistence
//!
//! The repository is the only component that mutates and persists course
//! state. Every mutation loads the current state, applies the change and
//! writes it back before returning.
//!
//! Layout, per course:
//! - `course-<id>-progress`: `{ "module-1": { "completed": true, ... }, ... }`
//! - `course-<id>-achievements`: `["perfect-score", ...]`
//! - `course-<id>-discussions`: the discussion board
//!
//! Older data stored `course-<id>-progress` as `moduleId -> bool` with the
//! other fields in `quiz-scores`, `time-spent` and `notes` siblings. That
//! layout is still read and is rewritten in the current layout on next save.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::achievements::AchievementSet;
use super::model::{CourseState, ModuleProgressRecord, validate_score, validate_time_delta};
use crate::catalog::Course;
use crate::config::Thresholds;
use crate::discussion::DiscussionBoard;
use crate::error::Result;
use crate::store::{Concern, KeyValueStore, course_key};

#[derive(Deserialize)]
#[serde(untagged)]
enum ProgressDocument {
    Records(BTreeMap<String, ModuleProgressRecord>),
    Legacy(BTreeMap<String, bool>),
}

/// Durable CRUD for course progress
#[derive(Debug)]
pub struct ProgressRepository<S> {
    store: S,
    thresholds: Thresholds,
}

impl<S: KeyValueStore> ProgressRepository<S> {
    /// Create a repository over a store
    pub fn new(store: S, thresholds: Thresholds) -> Self {
        Self { store, thresholds }
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Thresholds applied to quiz submissions
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Load a course's state, defaulting anything missing or unreadable
    ///
    /// The result always holds exactly one record per curriculum module, in
    /// curriculum order. Records for modules no longer in the curriculum are
    /// dropped.
    pub fn load(&self, course: &Course) -> CourseState {
        let mut stored = match self.read_json::<ProgressDocument>(&course.id, Concern::Progress) {
            Some(ProgressDocument::Records(records)) => records,
            Some(ProgressDocument::Legacy(completed)) => self.import_legacy(&course.id, completed),
            None => BTreeMap::new(),
        };

        let modules = course
            .module_ids()
            .map(|module_id| {
                let mut record = stored.remove(&module_id).unwrap_or_default();
                record.module_id = module_id;
                record.quiz_score = record.quiz_score.min(100);
                record
            })
            .collect();

        if !stored.is_empty() {
            debug!(
                "Dropping {} stored records outside the curriculum of {}",
                stored.len(),
                course.id
            );
        }

        let achievements = self
            .read_json::<Vec<String>>(&course.id, Concern::Achievements)
            .map(|ids| AchievementSet::from_ids(ids.iter().map(String::as_str)))
            .unwrap_or_default();

        CourseState { course_id: course.id.clone(), modules, achievements }
    }

    /// Overwrite the persisted state for a course
    ///
    /// Module records are written as a single value so no reader can observe
    /// some modules updated and others not.
    pub fn save(&mut self, state: &CourseState) -> Result<()> {
        let records: BTreeMap<&str, &ModuleProgressRecord> =
            state.modules.iter().map(|m| (m.module_id.as_str(), m)).collect();
        self.write_json(&state.course_id, Concern::Progress, &records)?;
        self.save_achievements(&state.course_id, &state.achievements)
    }

    /// Persist only the achievement set
    pub fn save_achievements(&mut self, course_id: &str, achievements: &AchievementSet) -> Result<()> {
        self.write_json(course_id, Concern::Achievements, achievements)
    }

    /// Mark a module complete or incomplete
    pub fn set_module_completion(
        &mut self,
        course: &Course,
        module_id: &str,
        completed: bool,
    ) -> Result<CourseState> {
        self.mutate(course, |state| state.set_completion(module_id, completed))
    }

    /// Record a quiz score, completing the module if it passes
    pub fn record_quiz_score(&mut self, course: &Course, module_id: &str, score: i32) -> Result<CourseState> {
        validate_score(score)?;
        let passing = self.thresholds.passing_score;
        self.mutate(course, |state| state.record_quiz_score(module_id, score, passing))
    }

    /// Add minutes to a module's time counter
    pub fn add_time_spent(&mut self, course: &Course, module_id: &str, minutes: i64) -> Result<CourseState> {
        validate_time_delta(minutes)?;
        self.mutate(course, |state| state.add_time_spent(module_id, minutes))
    }

    /// Replace a module's notes
    pub fn add_note(&mut self, course: &Course, module_id: &str, text: &str) -> Result<CourseState> {
        self.mutate(course, |state| state.set_note(module_id, text))
    }

    /// Load a course's discussion board, empty if missing or unreadable
    pub fn load_discussions(&self, course_id: &str) -> DiscussionBoard {
        self.read_json(course_id, Concern::Discussions).unwrap_or_default()
    }

    /// Overwrite a course's discussion board
    pub fn save_discussions(&mut self, course_id: &str, board: &DiscussionBoard) -> Result<()> {
        self.write_json(course_id, Concern::Discussions, board)
    }

    fn mutate(
        &mut self,
        course: &Course,
        apply: impl FnOnce(&mut CourseState) -> Result<()>,
    ) -> Result<CourseState> {
        let mut state = self.load(course);
        apply(&mut state)?;
        self.save(&state)?;
        Ok(state)
    }

    fn import_legacy(
        &self,
        course_id: &str,
        completed: BTreeMap<String, bool>,
    ) -> BTreeMap<String, ModuleProgressRecord> {
        debug!("Importing legacy progress layout for {}", course_id);

        let mut records: BTreeMap<String, ModuleProgressRecord> = completed
            .into_iter()
            .map(|(id, completed)| (id, ModuleProgressRecord { completed, ..Default::default() }))
            .collect();

        let scores: BTreeMap<String, u8> =
            self.read_json(course_id, Concern::QuizScores).unwrap_or_default();
        for (id, score) in scores {
            let record = records.entry(id).or_default();
            record.quiz_score = score;
            record.quiz_attempts = 1;
        }

        let minutes: BTreeMap<String, u32> =
            self.read_json(course_id, Concern::TimeSpent).unwrap_or_default();
        for (id, spent) in minutes {
            records.entry(id).or_default().time_spent_minutes = spent;
        }

        let notes: BTreeMap<String, String> =
            self.read_json(course_id, Concern::Notes).unwrap_or_default();
        for (id, text) in notes {
            if !text.trim().is_empty() {
                records.entry(id).or_default().notes = Some(text);
            }
        }

        records
    }

    fn read_json<T: DeserializeOwned>(&self, course_id: &str, concern: Concern) -> Option<T> {
        let key = course_key(course_id, concern);
        match self.store.get(&key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring malformed value for {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(
        &mut self,
        course_id: &str,
        concern: Concern,
        value: &T,
    ) -> Result<()> {
        let key = course_key(course_id, concern);
        let bytes = serde_json::to_vec(value)?;
        self.store.set(&key, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::progress::achievements::Achievement;
    use crate::progress::aggregate::CourseProgressAggregate;
    use crate::store::{FileStore, MemoryStore};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn course() -> Course {
        Course::new("safety", "Workplace Safety", ["Hazards", "Equipment", "Reporting"])
    }

    fn repo() -> ProgressRepository<MemoryStore> {
        ProgressRepository::new(MemoryStore::new(), Thresholds::default())
    }

    #[test]
    fn load_unknown_course_is_default() {
        let repo = repo();
        let state = repo.load(&course());

        assert_eq!(state, CourseState::new(&course()));
        assert_eq!(CourseProgressAggregate::compute(&state).completion_percent, 0);
    }

    #[test]
    fn save_then_load_is_identity() {
        let mut repo = repo();
        let course = course();
        let mut state = CourseState::new(&course);
        state.record_quiz_score("module-1", 100, 70).unwrap();
        state.add_time_spent("module-2", 42).unwrap();
        state.set_note("module-3", "check the fire exits").unwrap();
        state.achievements = [Achievement::PerfectScore].into_iter().collect();

        repo.save(&state).unwrap();
        assert_eq!(repo.load(&course), state);
    }

    fn record_strategy() -> impl Strategy<Value = ModuleProgressRecord> {
        (any::<bool>(), 0u8..=100, 0u32..50, 0u32..10_000, proptest::option::of("[a-z][a-z ]{0,19}")).prop_map(
            |(completed, quiz_score, quiz_attempts, time_spent_minutes, notes)| ModuleProgressRecord {
                module_id: String::new(),
                completed,
                quiz_score,
                quiz_attempts,
                time_spent_minutes,
                notes,
            },
        )
    }

    proptest! {
        #[test]
        fn any_saved_state_loads_back_unchanged(
            records in prop::collection::vec(record_strategy(), 3),
            unlocked in prop::collection::vec(any::<bool>(), Achievement::ALL.len()),
        ) {
            let mut repo = repo();
            let course = course();
            let mut state = CourseState::new(&course);
            for (module, record) in state.modules.iter_mut().zip(records) {
                *module = ModuleProgressRecord { module_id: module.module_id.clone(), ..record };
            }
            state.achievements = Achievement::ALL
                .into_iter()
                .zip(unlocked)
                .filter_map(|(achievement, on)| on.then_some(achievement))
                .collect();

            repo.save(&state).unwrap();
            prop_assert_eq!(repo.load(&course), state);
        }
    }

    #[test]
    fn mutations_write_through() {
        let mut repo = repo();
        let course = course();

        repo.set_module_completion(&course, "module-2", true).unwrap();
        repo.record_quiz_score(&course, "module-1", 75).unwrap();
        repo.add_time_spent(&course, "module-1", 3).unwrap();
        repo.add_note(&course, "module-1", "review").unwrap();

        let state = repo.load(&course);
        let m1 = state.module("module-1").unwrap();
        assert!(m1.completed);
        assert_eq!(m1.quiz_score, 75);
        assert_eq!(m1.time_spent_minutes, 3);
        assert_eq!(m1.notes.as_deref(), Some("review"));
        assert!(state.module("module-2").unwrap().completed);
    }

    #[test]
    fn set_completion_is_idempotent() {
        let mut repo = repo();
        let course = course();
        let first = repo.set_module_completion(&course, "module-1", true).unwrap();
        let second = repo.set_module_completion(&course, "module-1", true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_input_does_not_touch_store() {
        let mut repo = repo();
        let course = course();

        assert!(matches!(repo.record_quiz_score(&course, "module-1", 150), Err(TrackerError::InvalidScore(150))));
        assert!(matches!(repo.add_time_spent(&course, "module-1", -1), Err(TrackerError::InvalidTimeDelta(-1))));
        assert!(repo.store().is_empty());
    }

    #[test]
    fn unknown_module_does_not_write() {
        let mut repo = repo();
        let err = repo.set_module_completion(&course(), "module-12", true).unwrap_err();
        assert!(matches!(err, TrackerError::UnknownModule { .. }));
        assert!(repo.store().is_empty());
    }

    #[test]
    fn malformed_progress_falls_back_to_default() {
        let mut store = MemoryStore::new();
        store.set("course-safety-progress", b"{not json").unwrap();
        store.set("course-safety-achievements", b"42").unwrap();
        let repo = ProgressRepository::new(store, Thresholds::default());

        assert_eq!(repo.load(&course()), CourseState::new(&course()));
    }

    #[test]
    fn corrupt_course_does_not_affect_others() {
        let mut repo = repo();
        let other = Course::new("privacy", "Privacy", ["Basics"]);
        repo.set_module_completion(&other, "module-1", true).unwrap();
        repo.store.set("course-safety-progress", b"garbage").unwrap();

        assert!(repo.load(&other).module("module-1").unwrap().completed);
        assert!(!repo.load(&course()).module("module-1").unwrap().completed);
    }

    #[test]
    fn curriculum_changes_are_reconciled() {
        let mut repo = repo();
        let long = Course::new("safety", "Workplace Safety", ["A", "B", "C", "D"]);
        repo.set_module_completion(&long, "module-4", true).unwrap();
        repo.set_module_completion(&long, "module-1", true).unwrap();

        let state = repo.load(&course());
        assert_eq!(state.modules.len(), 3);
        assert!(state.module("module-1").unwrap().completed);
        assert!(state.module("module-4").is_none());
    }

    #[test]
    fn legacy_layout_is_imported() {
        let mut store = MemoryStore::new();
        store.set("course-safety-progress", br#"{"module-1":true,"module-2":false}"#).unwrap();
        store.set("course-safety-quiz-scores", br#"{"module-2":55}"#).unwrap();
        store.set("course-safety-time-spent", br#"{"module-1":30,"module-3":5}"#).unwrap();
        store.set("course-safety-notes", br#"{"module-3":"ask about ladders"}"#).unwrap();
        store.set("course-safety-achievements", br#"["first-post"]"#).unwrap();
        let repo = ProgressRepository::new(store, Thresholds::default());

        let state = repo.load(&course());
        let m1 = state.module("module-1").unwrap();
        let m2 = state.module("module-2").unwrap();
        let m3 = state.module("module-3").unwrap();
        assert!(m1.completed);
        assert_eq!(m1.time_spent_minutes, 30);
        assert!(!m2.completed);
        assert_eq!((m2.quiz_score, m2.quiz_attempts), (55, 1));
        assert_eq!(m3.notes.as_deref(), Some("ask about ladders"));
        assert!(state.achievements.contains(Achievement::FirstPost));
    }

    #[test]
    fn legacy_state_is_rewritten_on_save() {
        let mut store = MemoryStore::new();
        store.set("course-safety-progress", br#"{"module-1":true}"#).unwrap();
        let mut repo = ProgressRepository::new(store, Thresholds::default());

        repo.add_time_spent(&course(), "module-2", 1).unwrap();
        let raw = repo.store().get("course-safety-progress").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["module-1"]["completed"], serde_json::json!(true));
        assert_eq!(value["module-2"]["time_spent_minutes"], serde_json::json!(1));
    }

    #[test]
    fn discussions_round_trip() {
        let mut repo = repo();
        assert!(repo.load_discussions("safety").is_empty());

        let mut board = DiscussionBoard::default();
        board.post("Ana", "Where is the eyewash station?", 1).unwrap();
        repo.save_discussions("safety", &board).unwrap();

        assert_eq!(repo.load_discussions("safety"), board);
    }

    #[test]
    fn file_store_persists_across_repositories() {
        let temp_dir = TempDir::new().unwrap();
        let course = course();
        {
            let store = FileStore::open(temp_dir.path()).unwrap();
            let mut repo = ProgressRepository::new(store, Thresholds::default());
            repo.record_quiz_score(&course, "module-3", 90).unwrap();
        }

        let store = FileStore::open(temp_dir.path()).unwrap();
        let repo = ProgressRepository::new(store, Thresholds::default());
        let state = repo.load(&course);
        assert!(state.module("module-3").unwrap().completed);
        assert_eq!(state.module("module-3").unwrap().quiz_score, 90);
    }
}
