//! Course catalog
//!
//! Read-only course reference data: ids, titles and curricula.

pub mod model;
pub mod storage;

// Re-exports
pub use model::{Course, CourseMetadata, Level, module_id, module_position};
pub use storage::Catalog;
