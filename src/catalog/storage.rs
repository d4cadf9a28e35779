//! Course catalog loading
//!
//! The catalog is read from `courses.json` in the config directory when it
//! exists, otherwise the built-in training catalog is used.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::model::{Course, CourseMetadata, Level};
use crate::config::Config;
use crate::store::{Concern, course_key, validate_key};

/// The course catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// All courses in display order
    pub courses: Vec<Course>,
}

impl Catalog {
    /// Load the catalog from the config directory, falling back to built-ins
    pub fn load() -> Result<Self> {
        Self::load_from(&Config::catalog_path()?)
    }

    /// Load the catalog from a specific path, falling back to built-ins
    ///
    /// Courses whose id cannot be used in a store key are skipped.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::builtin());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog from {:?}", path))?;
        let mut catalog: Self =
            serde_json::from_str(&contents).with_context(|| "Failed to parse courses.json")?;
        catalog.courses.retain(|course| match validate_key(&course_key(&course.id, Concern::Progress)) {
            Ok(()) => true,
            Err(_) => {
                warn!("Skipping course {:?}: ids may only use letters, digits, '-' and '_'", course.id);
                false
            }
        });
        Ok(catalog)
    }

    /// Find a course by ID
    pub fn find_by_id(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// Find a course by title (case-insensitive partial match)
    pub fn find_by_title(&self, query: &str) -> Option<&Course> {
        let query_lower = query.to_lowercase();
        self.courses.iter().find(|c| c.title.to_lowercase().contains(&query_lower))
    }

    /// Find by exact id first, then by title fragment
    pub fn find(&self, query: &str) -> Option<&Course> {
        self.find_by_id(query).or_else(|| self.find_by_title(query))
    }

    /// List all courses
    pub fn list(&self) -> &[Course] {
        &self.courses
    }

    /// Built-in training catalog
    pub fn builtin() -> Self {
        Self {
            courses: vec![
                builtin_course(
                    "workplace-safety",
                    "Workplace Safety Fundamentals",
                    "Hazard awareness, protective equipment and incident reporting.",
                    "3 hours",
                    Level::Beginner,
                    "Compliance",
                    &[
                        "Identifying Workplace Hazards",
                        "Personal Protective Equipment",
                        "Emergency Procedures",
                        "Incident Reporting",
                    ],
                ),
                builtin_course(
                    "data-privacy",
                    "Data Privacy and Protection",
                    "Handling personal data, retention rules and breach response.",
                    "4 hours",
                    Level::Intermediate,
                    "Compliance",
                    &[
                        "Principles of Data Protection",
                        "Lawful Processing",
                        "Data Subject Rights",
                        "Retention and Deletion",
                        "Responding to a Breach",
                    ],
                ),
                builtin_course(
                    "leadership-essentials",
                    "Leadership Essentials",
                    "Feedback, delegation and running effective one-on-ones.",
                    "6 hours",
                    Level::Advanced,
                    "Management",
                    &[
                        "Giving and Receiving Feedback",
                        "Delegation",
                        "Effective One-on-Ones",
                        "Leading Through Change",
                        "Coaching Conversations",
                        "Building Trust",
                    ],
                ),
            ],
        }
    }
}

fn builtin_course(
    id: &str,
    title: &str,
    description: &str,
    duration: &str,
    level: Level,
    category: &str,
    modules: &[&str],
) -> Course {
    Course {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        metadata: CourseMetadata { duration: duration.to_string(), level, category: category.to_string() },
        curriculum: modules.iter().map(|m| m.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_catalog_has_courses() {
        let catalog = Catalog::builtin();
        assert!(!catalog.list().is_empty());
        assert!(catalog.courses.iter().all(|c| c.module_count() > 0));
    }

    #[test]
    fn catalog_find_by_id() {
        let catalog = Catalog::builtin();
        assert!(catalog.find_by_id("data-privacy").is_some());
        assert!(catalog.find_by_id("nonexistent").is_none());
    }

    #[test]
    fn catalog_find_by_title() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.find_by_title("LEADERSHIP").map(|c| c.id.as_str()), Some("leadership-essentials"));
        assert!(catalog.find_by_title("python").is_none());
    }

    #[test]
    fn find_prefers_id() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.find("workplace-safety").map(|c| c.id.as_str()), Some("workplace-safety"));
        assert_eq!(catalog.find("privacy").map(|c| c.id.as_str()), Some("data-privacy"));
    }

    #[test]
    fn load_from_missing_path_uses_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = Catalog::load_from(&temp_dir.path().join("courses.json")).unwrap();
        assert_eq!(catalog.courses.len(), Catalog::builtin().courses.len());
    }

    #[test]
    fn load_from_file_overrides_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("courses.json");
        fs::write(&path, r#"{"courses":[{"id":"onboarding","title":"Onboarding","curriculum":["Welcome","Tools"]}]}"#)
            .unwrap();

        let catalog = Catalog::load_from(&path).unwrap();
        assert_eq!(catalog.courses.len(), 1);
        assert_eq!(catalog.find_by_id("onboarding").unwrap().module_count(), 2);
    }

    #[test]
    fn load_from_skips_courses_with_unusable_ids() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("courses.json");
        fs::write(
            &path,
            r#"{"courses":[
                {"id":"safety 101","title":"Safety","curriculum":["Intro"]},
                {"id":"../escape","title":"Escape","curriculum":["Intro"]},
                {"id":"safety_101","title":"Safety Basics","curriculum":["Intro"]}
            ]}"#,
        )
        .unwrap();

        let catalog = Catalog::load_from(&path).unwrap();
        let ids: Vec<&str> = catalog.list().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["safety_101"]);
    }

    #[test]
    fn builtin_ids_are_usable_keys() {
        for course in Catalog::builtin().list() {
            assert!(validate_key(&course_key(&course.id, Concern::Progress)).is_ok(), "{}", course.id);
        }
    }

    #[test]
    fn load_from_malformed_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("courses.json");
        fs::write(&path, "not json").unwrap();
        assert!(Catalog::load_from(&path).is_err());
    }
}
