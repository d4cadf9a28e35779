//! Achievement rules
//!
//! Badges are one-way: once unlocked they stay unlocked for the life of the
//! course state. [`evaluate`] is pure and always returns a superset of its
//! input set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::aggregate::CourseProgressAggregate;
use crate::config::Thresholds;

/// A badge that can be unlocked in a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Achievement {
    /// Every module complete
    CourseCompleted,
    /// A quiz scored 100
    PerfectScore,
    /// More than the dedicated-learner threshold of minutes spent
    DedicatedLearner,
    /// First discussion post by the learner
    FirstPost,
}

impl Achievement {
    /// All badges in evaluation order
    pub const ALL: [Achievement; 4] = [
        Achievement::CourseCompleted,
        Achievement::PerfectScore,
        Achievement::DedicatedLearner,
        Achievement::FirstPost,
    ];

    /// Stable identifier used in persisted data
    pub fn id(self) -> &'static str {
        match self {
            Achievement::CourseCompleted => "course-completed",
            Achievement::PerfectScore => "perfect-score",
            Achievement::DedicatedLearner => "dedicated-learner",
            Achievement::FirstPost => "first-post",
        }
    }

    /// Parse a persisted identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    /// Display title
    pub fn title(self) -> &'static str {
        match self {
            Achievement::CourseCompleted => "Course Completed",
            Achievement::PerfectScore => "Perfect Score",
            Achievement::DedicatedLearner => "Dedicated Learner",
            Achievement::FirstPost => "First Post",
        }
    }

    /// One-line description of how the badge is earned
    pub fn description(self) -> &'static str {
        match self {
            Achievement::CourseCompleted => "Completed every module in the course",
            Achievement::PerfectScore => "Scored 100% on a module quiz",
            Achievement::DedicatedLearner => "Spent more than two hours studying the course",
            Achievement::FirstPost => "Started a discussion in the course",
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Discrete events that can unlock badges on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    /// A top-level discussion post was created
    DiscussionPosted {
        /// Whether the learner wrote it
        by_learner: bool,
    },
}

/// Unlocked badges for a course
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementSet(BTreeSet<Achievement>);

impl AchievementSet {
    /// Build a set from persisted identifiers, skipping unknown ones
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self(ids.into_iter().filter_map(Achievement::from_id).collect())
    }

    pub fn contains(&self, achievement: Achievement) -> bool {
        self.0.contains(&achievement)
    }

    pub fn iter(&self) -> impl Iterator<Item = Achievement> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Badges in `self` that are missing from `previous`
    pub fn newly_unlocked(&self, previous: &AchievementSet) -> Vec<Achievement> {
        self.0.difference(&previous.0).copied().collect()
    }

    fn unlock(&mut self, achievement: Achievement) -> bool {
        self.0.insert(achievement)
    }
}

impl FromIterator<Achievement> for AchievementSet {
    fn from_iter<I: IntoIterator<Item = Achievement>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Apply every badge rule to the current aggregate and event
pub fn evaluate(
    previous: &AchievementSet,
    aggregate: &CourseProgressAggregate,
    event: Option<ActivityEvent>,
    thresholds: &Thresholds,
) -> AchievementSet {
    let mut next = previous.clone();
    for achievement in Achievement::ALL {
        if !next.contains(achievement) && rule_holds(achievement, aggregate, event, thresholds) {
            next.unlock(achievement);
        }
    }
    next
}

fn rule_holds(
    achievement: Achievement,
    aggregate: &CourseProgressAggregate,
    event: Option<ActivityEvent>,
    thresholds: &Thresholds,
) -> bool {
    match achievement {
        Achievement::CourseCompleted => aggregate.certificate_eligible,
        Achievement::PerfectScore => aggregate.best_quiz_score == Some(100),
        Achievement::DedicatedLearner => {
            aggregate.total_time_spent_minutes > u64::from(thresholds.dedicated_learner_minutes)
        }
        Achievement::FirstPost => {
            matches!(event, Some(ActivityEvent::DiscussionPosted { by_learner: true }))
        }
    }
}
