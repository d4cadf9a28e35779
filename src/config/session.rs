//! Session state persistence
//!
//! Remembers which course was open and which modules were expanded so a
//! study session can resume where it left off.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Config;

/// Session state for a specific course
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseSession {
    /// Expanded module ids
    pub expanded_modules: BTreeSet<String>,
    /// Whether the content view was open
    #[serde(default)]
    pub on_content: bool,
}

/// All session state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Currently open course ID (if any)
    pub current_course_id: Option<String>,
    /// Session state per course (key is course ID)
    pub courses: HashMap<String, CourseSession>,
}

impl Session {
    /// Load session from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::session_path()?)
    }

    /// Load session from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read session from {:?}", path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse session.json")
        } else {
            Ok(Self::default())
        }
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::session_path()?)
    }

    /// Save session to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize session")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write session to {:?}", path))?;

        Ok(())
    }

    /// Get the path to the session file
    fn session_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("session.json"))
    }

    /// Get or create session for a course
    pub fn course_mut(&mut self, course_id: &str) -> &mut CourseSession {
        self.courses.entry(course_id.to_string()).or_default()
    }

    /// Get session for a course (if exists)
    pub fn course(&self, course_id: &str) -> Option<&CourseSession> {
        self.courses.get(course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn session_default_is_empty() {
        let session = Session::default();
        assert!(session.current_course_id.is_none());
        assert!(session.courses.is_empty());
    }

    #[test]
    fn course_mut_creates_entry() {
        let mut session = Session::default();
        session.course_mut("safety").expanded_modules.insert("module-2".into());

        assert!(session.courses.contains_key("safety"));
        assert!(session.course("safety").unwrap().expanded_modules.contains("module-2"));
    }

    #[test]
    fn session_round_trips_through_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        let mut session = Session { current_course_id: Some("privacy".into()), ..Default::default() };
        let course = session.course_mut("privacy");
        course.expanded_modules.insert("module-1".into());
        course.on_content = true;
        session.save_to(&path).unwrap();

        let loaded = Session::load_from(&path).unwrap();
        assert_eq!(loaded.current_course_id.as_deref(), Some("privacy"));
        let course = loaded.course("privacy").unwrap();
        assert!(course.on_content);
        assert_eq!(course.expanded_modules.len(), 1);
    }

    #[test]
    fn session_deserializes_without_content_flag() {
        let json = r#"{
            "current_course_id": "test",
            "courses": { "test": { "expanded_modules": ["module-3"] } }
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        let course = session.course("test").unwrap();
        assert!(!course.on_content);
        assert!(course.expanded_modules.contains("module-3"));
    }
}
