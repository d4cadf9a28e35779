//! Course progress tracking
//!
//! Per-module records, their persistence, the metrics derived from them and
//! the badge rules evaluated after every change.

pub mod achievements;
pub mod aggregate;
pub mod model;
pub mod repository;

// Re-exports
pub use achievements::{Achievement, AchievementSet, ActivityEvent, evaluate};
pub use aggregate::CourseProgressAggregate;
pub use model::{CourseState, ModuleProgressRecord};
pub use repository::ProgressRepository;
