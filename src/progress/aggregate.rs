//! Derived course metrics
//!
//! Aggregates are never stored. They are recomputed from a [`CourseState`]
//! whenever they are needed.

use serde::Serialize;

use super::model::CourseState;

/// Summary statistics for one course
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProgressAggregate {
    /// Modules marked complete
    pub completed_count: usize,
    /// Modules in the curriculum
    pub total_modules: usize,
    /// `round(completed / total * 100)`, zero for an empty curriculum
    pub completion_percent: u8,
    /// Mean of submitted quiz scores, zero when nothing was submitted
    pub average_quiz_score: f64,
    /// Highest of the modules' latest quiz scores, `None` before any submission
    pub best_quiz_score: Option<u8>,
    /// Modules with at least one quiz submission
    pub quiz_submissions: usize,
    /// Minutes across all modules
    pub total_time_spent_minutes: u64,
    /// Every module complete in a non-empty curriculum
    pub certificate_eligible: bool,
}

impl CourseProgressAggregate {
    /// Compute the aggregate for a course state
    pub fn compute(state: &CourseState) -> Self {
        let total_modules = state.modules.len();
        let completed_count = state.modules.iter().filter(|m| m.completed).count();

        let completion_percent = if total_modules == 0 {
            0
        } else {
            (completed_count as f64 / total_modules as f64 * 100.0).round() as u8
        };

        let scores: Vec<u8> =
            state.modules.iter().filter(|m| m.has_quiz_score()).map(|m| m.quiz_score).collect();
        let average_quiz_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
        };

        Self {
            completed_count,
            total_modules,
            completion_percent,
            average_quiz_score,
            best_quiz_score: scores.iter().copied().max(),
            quiz_submissions: scores.len(),
            total_time_spent_minutes: state
                .modules
                .iter()
                .map(|m| u64::from(m.time_spent_minutes))
                .sum(),
            certificate_eligible: total_modules > 0 && completed_count == total_modules,
        }
    }

    /// Modules still to complete
    pub fn remaining_modules(&self) -> usize {
        self.total_modules - self.completed_count
    }
}
