//! Course model
//!
//! Courses are immutable reference data. The tracker only reads a course's
//! id and curriculum to decide how many modules exist and what they are called.

use serde::{Deserialize, Serialize};

/// Difficulty level of a course
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        };
        f.write_str(name)
    }
}

/// Descriptive metadata shown in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMetadata {
    /// Human readable duration (e.g., "4 hours")
    pub duration: String,
    /// Difficulty level
    #[serde(default)]
    pub level: Level,
    /// Category (e.g., "Compliance")
    pub category: String,
}

/// A course in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier for the course
    pub id: String,
    /// Display title
    pub title: String,
    /// Description or summary
    #[serde(default)]
    pub description: String,
    /// Catalog metadata
    #[serde(default)]
    pub metadata: CourseMetadata,
    /// Module titles in order
    pub curriculum: Vec<String>,
}

impl Course {
    /// Create a course with the given curriculum
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        curriculum: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            metadata: CourseMetadata::default(),
            curriculum: curriculum.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of modules in the curriculum
    pub fn module_count(&self) -> usize {
        self.curriculum.len()
    }

    /// Stable module ids in curriculum order
    pub fn module_ids(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.curriculum.len()).map(module_id)
    }

    /// Whether `module_id` names a module of this course
    pub fn has_module(&self, module_id: &str) -> bool {
        module_position(module_id).is_some_and(|n| n <= self.curriculum.len())
    }

    /// Title of a module by id
    pub fn module_title(&self, module_id: &str) -> Option<&str> {
        module_position(module_id).and_then(|n| self.curriculum.get(n - 1)).map(String::as_str)
    }

    /// Resolve user input (`module-3` or `3`) to a module id of this course
    pub fn resolve_module(&self, input: &str) -> Option<String> {
        let input = input.trim();
        let position = match input.strip_prefix("module-") {
            Some(rest) => parse_position(rest)?,
            None => parse_position(input)?,
        };
        (position <= self.curriculum.len()).then(|| module_id(position))
    }
}

/// Module id for a 1-based curriculum position
pub fn module_id(position: usize) -> String {
    format!("module-{position}")
}

/// 1-based curriculum position encoded in a canonical module id
///
/// Only `module-<n>` without sign or leading zeros is accepted, so every
/// module has exactly one id.
pub fn module_position(module_id: &str) -> Option<usize> {
    let digits = module_id.strip_prefix("module-")?;
    if digits.starts_with('0') {
        return None;
    }
    parse_position(digits)
}

// Lenient form for user input: "03" is module 3
fn parse_position(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<usize>().ok().filter(|n| *n > 0)
}
