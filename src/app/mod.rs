//! Interactive study session
//!
//! A single task owns the tracker and multiplexes prompt input, timer ticks
//! and tracker notifications, so every mutation happens in arrival order.

pub mod command;

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::catalog::Course;
use crate::error::TrackerError;
use crate::export::format_minutes;
use crate::progress::{CourseProgressAggregate, CourseState};
use crate::store::KeyValueStore;
use crate::tracker::{CourseTracker, SessionTimer, TimerState, TimerTick, TrackerEvent};
use command::{Command, HELP, ParseResult, parse_command};

/// Which part of the course the learner is looking at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    /// Course overview; no time is attributed
    #[default]
    Overview,
    /// Module content; the session timer runs
    Content,
}

/// A study session over one course
pub struct StudySession<S> {
    tracker: CourseTracker<S>,
    events: mpsc::UnboundedReceiver<TrackerEvent>,
    timer: SessionTimer,
    tick_tx: mpsc::UnboundedSender<TimerTick>,
    ticks: mpsc::UnboundedReceiver<TimerTick>,
    view: View,
}

impl<S: KeyValueStore> StudySession<S> {
    /// Create a session; the timer starts in the overview (stopped)
    pub fn new(
        tracker: CourseTracker<S>,
        events: mpsc::UnboundedReceiver<TrackerEvent>,
        tick_interval: std::time::Duration,
    ) -> Self {
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        Self {
            tracker,
            events,
            timer: SessionTimer::new(tick_interval),
            tick_tx,
            ticks,
            view: View::Overview,
        }
    }

    pub fn tracker(&self) -> &CourseTracker<S> {
        &self.tracker
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    /// Switch views, starting or stopping the timer
    ///
    /// Starting requires a tokio runtime.
    pub fn set_view(&mut self, view: View) {
        self.view = view;
        match view {
            View::Content => {
                self.timer.start(self.tick_tx.clone());
            }
            View::Overview => {
                self.timer.stop();
            }
        }
    }

    /// Run against the process's stdin and stdout
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        self.run_with(stdin, &mut stdout).await
    }

    /// Run until `quit` or end of input
    pub async fn run_with<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "Studying {}. Type 'help' for commands.", self.tracker.course().title)?;
        let mut lines = input.lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    let quit = self.handle_line(&line, out)?;
                    self.flush_events(out)?;
                    if quit {
                        break;
                    }
                }

                Some(tick) = self.ticks.recv() => {
                    if self.timer.is_current(&tick) {
                        match self.tracker.on_tick() {
                            Ok(Some(module_id)) => debug!("Credited a minute to {}", module_id),
                            Ok(None) => {}
                            Err(e) => warn!("Failed to record tick: {}", e),
                        }
                        self.flush_events(out)?;
                    }
                }
            }
        }

        // Leaving keeps the view so it can be restored next time
        self.timer.stop();
        Ok(())
    }

    /// Handle one prompt line; returns true if the session should end
    fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<bool> {
        let command = match parse_command(line) {
            ParseResult::Ok(command) => command,
            ParseResult::UnknownCommand(cmd) => {
                writeln!(out, "Unknown command: {}", cmd)?;
                return Ok(false);
            }
            ParseResult::MissingArgument(cmd) => {
                writeln!(out, "Missing argument for {}", cmd)?;
                return Ok(false);
            }
            ParseResult::InvalidArgument(arg) => {
                writeln!(out, "Invalid {}", arg)?;
                return Ok(false);
            }
        };

        match self.execute(command, out) {
            Ok(quit) => Ok(quit),
            Err(e) => match e.downcast::<TrackerError>() {
                Ok(tracker_error) => {
                    writeln!(out, "Error: {}", tracker_error)?;
                    Ok(false)
                }
                Err(other) => Err(other),
            },
        }
    }

    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<bool> {
        match command {
            Command::Expand(input) => {
                let module_id = self.resolve(&input)?;
                self.tracker.on_expand_module(&module_id)?;
                if self.tracker.active_module().is_none() {
                    writeln!(out, "Several modules are expanded; time is not being recorded")?;
                }
            }
            Command::Collapse(input) => {
                let module_id = self.resolve(&input)?;
                if !self.tracker.on_collapse_module(&module_id) {
                    writeln!(out, "{} is not expanded", module_id)?;
                }
            }
            Command::Complete(input) => {
                let module_id = self.resolve(&input)?;
                self.tracker.on_set_completion(&module_id, true)?;
            }
            Command::Undo(input) => {
                let module_id = self.resolve(&input)?;
                self.tracker.on_set_completion(&module_id, false)?;
            }
            Command::Quiz { module, score } => {
                let module_id = self.resolve(&module)?;
                self.tracker.on_submit_quiz(&module_id, score)?;
            }
            Command::Note { module, text } => {
                let module_id = self.resolve(&module)?;
                self.tracker.on_note(&module_id, &text)?;
            }
            Command::Post(text) => {
                let author = self.tracker.learner().to_string();
                let post = self.tracker.on_post_discussion(&author, &text)?;
                writeln!(out, "Posted {}", post.id)?;
            }
            Command::Reply { post_id, text } => {
                let author = self.tracker.learner().to_string();
                let reply = self.tracker.on_reply(&post_id, &author, &text)?;
                writeln!(out, "Replied {}", reply.id)?;
            }
            Command::Content => self.set_view(View::Content),
            Command::Overview => self.set_view(View::Overview),
            Command::Status => {
                let state = self.tracker.state();
                write_status(out, self.tracker.course(), &state, Some(self.tracker.expanded_modules()))?;
            }
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => return Ok(true),
            Command::Nop => {}
        }
        Ok(false)
    }

    fn resolve(&self, input: &str) -> Result<String> {
        let course = self.tracker.course();
        course.resolve_module(input).ok_or_else(|| {
            TrackerError::UnknownModule { course_id: course.id.clone(), module_id: input.to_string() }
                .into()
        })
    }

    fn flush_events<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let mut latest = None;
        while let Ok(event) = self.events.try_recv() {
            match event {
                TrackerEvent::AchievementUnlocked(achievement) => {
                    writeln!(
                        out,
                        "Achievement unlocked: {} ({})",
                        achievement.title(),
                        achievement.description()
                    )?;
                }
                TrackerEvent::AggregateUpdated(aggregate) => latest = Some(aggregate),
            }
        }
        if let Some(aggregate) = latest {
            writeln!(out, "{}", summary_line(&aggregate))?;
        }
        Ok(())
    }
}

/// One-line progress summary
pub fn summary_line(aggregate: &CourseProgressAggregate) -> String {
    format!(
        "Progress: {}% ({}/{} modules), average quiz {:.0}%, {} studied",
        aggregate.completion_percent,
        aggregate.completed_count,
        aggregate.total_modules,
        aggregate.average_quiz_score,
        format_minutes(aggregate.total_time_spent_minutes)
    )
}

/// Print per-module progress for a course
pub fn write_status<W: Write>(
    out: &mut W,
    course: &Course,
    state: &CourseState,
    expanded: Option<&BTreeSet<String>>,
) -> std::io::Result<()> {
    let aggregate = CourseProgressAggregate::compute(state);
    writeln!(out, "{} [{}]", course.title, course.id)?;
    for record in &state.modules {
        let marker = if record.completed { "[x]" } else { "[ ]" };
        let open = if expanded.is_some_and(|e| e.contains(&record.module_id)) { " (open)" } else { "" };
        let quiz = if record.has_quiz_score() { format!(" quiz {}%", record.quiz_score) } else { String::new() };
        writeln!(
            out,
            "  {} {:<10} {}{} {}{}",
            marker,
            record.module_id,
            course.module_title(&record.module_id).unwrap_or(""),
            quiz,
            format_minutes(u64::from(record.time_spent_minutes)),
            open
        )?;
    }
    writeln!(out, "{}", summary_line(&aggregate))?;
    if aggregate.certificate_eligible {
        writeln!(out, "Certificate available")?;
    }
    if !state.achievements.is_empty() {
        let titles: Vec<&str> = state.achievements.iter().map(|a| a.title()).collect();
        writeln!(out, "Achievements: {}", titles.join(", "))?;
    }
    Ok(())
}
