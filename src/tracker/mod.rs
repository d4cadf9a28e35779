//! Course tracker
//!
//! Turns learner interactions into repository writes, recomputes metrics,
//! evaluates badges and publishes the outcome. Every mutating handler runs
//! the same pipeline: write, aggregate, evaluate, notify.

pub mod timer;

use std::collections::BTreeSet;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::catalog::Course;
use crate::discussion::{DiscussionBoard, DiscussionPost, DiscussionReply, now_timestamp};
use crate::error::{Result, TrackerError};
use crate::progress::{
    Achievement, ActivityEvent, CourseProgressAggregate, CourseState, ProgressRepository, evaluate,
};
use crate::store::KeyValueStore;

pub use timer::{SessionTimer, TimerState, TimerTick};

/// Notifications published after mutations
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// A badge was unlocked for the first time
    AchievementUnlocked(Achievement),
    /// Metrics after a mutation
    AggregateUpdated(CourseProgressAggregate),
}

/// Event surface for one open course
pub struct CourseTracker<S> {
    course: Course,
    learner: String,
    repo: ProgressRepository<S>,
    expanded: BTreeSet<String>,
    events: mpsc::UnboundedSender<TrackerEvent>,
}

impl<S: KeyValueStore> CourseTracker<S> {
    /// Open a course for `learner`, returning the tracker and its event stream
    pub fn new(
        course: Course,
        learner: impl Into<String>,
        repo: ProgressRepository<S>,
    ) -> (Self, mpsc::UnboundedReceiver<TrackerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let tracker =
            Self { course, learner: learner.into(), repo, expanded: BTreeSet::new(), events };
        (tracker, rx)
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn learner(&self) -> &str {
        &self.learner
    }

    /// Current persisted state
    pub fn state(&self) -> CourseState {
        self.repo.load(&self.course)
    }

    /// Metrics recomputed from the current state
    pub fn aggregate(&self) -> CourseProgressAggregate {
        CourseProgressAggregate::compute(&self.state())
    }

    /// Current discussion board
    pub fn discussions(&self) -> DiscussionBoard {
        self.repo.load_discussions(&self.course.id)
    }

    /// Modules currently expanded in the view
    pub fn expanded_modules(&self) -> &BTreeSet<String> {
        &self.expanded
    }

    /// The module time is attributed to: the only expanded one
    pub fn active_module(&self) -> Option<&str> {
        match self.expanded.len() {
            1 => self.expanded.iter().next().map(String::as_str),
            _ => None,
        }
    }

    /// A module was expanded in the view
    pub fn on_expand_module(&mut self, module_id: &str) -> Result<()> {
        self.check_module(module_id)?;
        self.expanded.insert(module_id.to_string());
        Ok(())
    }

    /// A module was collapsed; returns false if it was not expanded
    pub fn on_collapse_module(&mut self, module_id: &str) -> bool {
        self.expanded.remove(module_id)
    }

    /// Flip a module's completion flag
    pub fn on_toggle_completion(&mut self, module_id: &str) -> Result<CourseProgressAggregate> {
        self.check_module(module_id)?;
        let completed = self.state().module(module_id).is_some_and(|m| m.completed);
        self.on_set_completion(module_id, !completed)
    }

    /// Set a module's completion flag explicitly
    pub fn on_set_completion(&mut self, module_id: &str, completed: bool) -> Result<CourseProgressAggregate> {
        let state = self.repo.set_module_completion(&self.course, module_id, completed)?;
        self.after_mutation(state, None)
    }

    /// A quiz was submitted for a module
    pub fn on_submit_quiz(&mut self, module_id: &str, score: i32) -> Result<CourseProgressAggregate> {
        let state = self.repo.record_quiz_score(&self.course, module_id, score)?;
        self.after_mutation(state, None)
    }

    /// Credit minutes to a module directly
    pub fn on_add_time(&mut self, module_id: &str, minutes: i64) -> Result<CourseProgressAggregate> {
        let state = self.repo.add_time_spent(&self.course, module_id, minutes)?;
        self.after_mutation(state, None)
    }

    /// One timer interval elapsed
    ///
    /// Credits one minute to the active module. With zero or several modules
    /// expanded the tick is dropped. Returns the credited module.
    pub fn on_tick(&mut self) -> Result<Option<String>> {
        let Some(module_id) = self.active_module().map(str::to_string) else {
            debug!("Dropping tick: {} modules expanded", self.expanded.len());
            return Ok(None);
        };

        let state = self.repo.add_time_spent(&self.course, &module_id, 1)?;
        self.after_mutation(state, None)?;
        Ok(Some(module_id))
    }

    /// Replace a module's notes
    pub fn on_note(&mut self, module_id: &str, text: &str) -> Result<CourseProgressAggregate> {
        let state = self.repo.add_note(&self.course, module_id, text)?;
        self.after_mutation(state, None)
    }

    /// A new discussion post was written
    pub fn on_post_discussion(&mut self, author: &str, content: &str) -> Result<DiscussionPost> {
        let mut board = self.discussions();
        let post = board.post(author, content, now_timestamp())?.clone();
        self.repo.save_discussions(&self.course.id, &board)?;

        let by_learner = post.author == self.learner.trim();
        let state = self.state();
        self.after_mutation(state, Some(ActivityEvent::DiscussionPosted { by_learner }))?;
        Ok(post)
    }

    /// A reply was written to an existing post
    ///
    /// Replies never unlock badges but still publish the current aggregate.
    pub fn on_reply(&mut self, post_id: &str, author: &str, content: &str) -> Result<DiscussionReply> {
        let mut board = self.discussions();
        let reply = board.reply(post_id, author, content, now_timestamp())?.clone();
        self.repo.save_discussions(&self.course.id, &board)?;

        let state = self.state();
        self.after_mutation(state, None)?;
        Ok(reply)
    }

    fn check_module(&self, module_id: &str) -> Result<()> {
        if self.course.has_module(module_id) {
            Ok(())
        } else {
            Err(TrackerError::UnknownModule {
                course_id: self.course.id.clone(),
                module_id: module_id.to_string(),
            })
        }
    }

    fn after_mutation(
        &mut self,
        state: CourseState,
        event: Option<ActivityEvent>,
    ) -> Result<CourseProgressAggregate> {
        let aggregate = CourseProgressAggregate::compute(&state);
        let achievements =
            evaluate(&state.achievements, &aggregate, event, self.repo.thresholds());
        let unlocked = achievements.newly_unlocked(&state.achievements);

        if !unlocked.is_empty() {
            self.repo.save_achievements(&state.course_id, &achievements)?;
        }
        for achievement in unlocked {
            info!("Unlocked {} in {}", achievement.id(), state.course_id);
            self.emit(TrackerEvent::AchievementUnlocked(achievement));
        }
        self.emit(TrackerEvent::AggregateUpdated(aggregate.clone()));

        Ok(aggregate)
    }

    fn emit(&self, event: TrackerEvent) {
        if self.events.send(event).is_err() {
            debug!("No listener for tracker events");
        }
    }
}
