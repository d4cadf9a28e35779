//! coursetrack - course progress tracking for internal training
//!
//! Tracks module completion, quiz scores, time on task and discussion
//! activity per course, derives completion metrics from them and unlocks
//! badges as learners reach milestones.

pub mod app;
pub mod catalog;
pub mod config;
pub mod discussion;
pub mod error;
pub mod export;
pub mod progress;
pub mod store;
pub mod tracker;

pub use catalog::{Catalog, Course};
pub use config::Config;
pub use error::TrackerError;
pub use progress::{CourseProgressAggregate, CourseState, ProgressRepository};
pub use tracker::CourseTracker;
