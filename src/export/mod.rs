//! Markdown export of progress reports and completion certificates

use serde::{Deserialize, Serialize};

use crate::catalog::Course;
use crate::discussion::DiscussionBoard;
use crate::error::{Result, TrackerError};
use crate::progress::{CourseProgressAggregate, CourseState};

const WRAP_WIDTH: usize = 80;

/// Render a Markdown progress report for a course
pub fn render_report(course: &Course, state: &CourseState, board: &DiscussionBoard) -> String {
    let aggregate = CourseProgressAggregate::compute(state);
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", course.title));
    if !course.description.is_empty() {
        out.push_str(&textwrap::fill(&course.description, WRAP_WIDTH));
        out.push_str("\n\n");
    }

    out.push_str("## Summary\n\n");
    out.push_str(&format!(
        "- Completion: {}% ({}/{} modules)\n",
        aggregate.completion_percent, aggregate.completed_count, aggregate.total_modules
    ));
    out.push_str(&format!(
        "- Average quiz score: {:.0}% across {} quizzes\n",
        aggregate.average_quiz_score, aggregate.quiz_submissions
    ));
    out.push_str(&format!("- Time spent: {}\n", format_minutes(aggregate.total_time_spent_minutes)));
    out.push_str(if aggregate.certificate_eligible {
        "- Certificate: eligible\n\n"
    } else {
        "- Certificate: not yet eligible\n\n"
    });

    out.push_str("## Modules\n\n");
    out.push_str("| # | Module | Done | Quiz | Time |\n");
    out.push_str("|---|--------|------|------|------|\n");
    for (index, record) in state.modules.iter().enumerate() {
        let title = course.module_title(&record.module_id).unwrap_or(&record.module_id);
        let quiz = if record.has_quiz_score() { format!("{}%", record.quiz_score) } else { "-".into() };
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            index + 1,
            title,
            if record.completed { "yes" } else { "no" },
            quiz,
            format_minutes(u64::from(record.time_spent_minutes))
        ));
    }

    let noted: Vec<_> = state.modules.iter().filter(|m| m.notes.is_some()).collect();
    if !noted.is_empty() {
        out.push_str("\n## Notes\n\n");
        for record in noted {
            let title = course.module_title(&record.module_id).unwrap_or(&record.module_id);
            out.push_str(&format!("### {}\n\n", title));
            if let Some(notes) = &record.notes {
                out.push_str(&textwrap::fill(notes, WRAP_WIDTH));
                out.push_str("\n\n");
            }
        }
    }

    if !state.achievements.is_empty() {
        out.push_str("\n## Achievements\n\n");
        for achievement in state.achievements.iter() {
            out.push_str(&format!("- **{}**: {}\n", achievement.title(), achievement.description()));
        }
    }

    if !board.is_empty() {
        out.push_str(&format!("\n## Discussion\n\n{} messages\n\n", board.message_count()));
        for post in &board.posts {
            out.push_str(&format!("**{}** ({} replies)\n\n", post.author, post.replies.len()));
            out.push_str(&quote(&post.content));
            out.push_str("\n\n");
        }
    }

    out
}

/// Proof of course completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub course_id: String,
    pub course_title: String,
    pub learner: String,
    /// Unix timestamp of issue
    pub issued_at: i64,
    pub modules_completed: usize,
    pub average_quiz_score: f64,
    pub total_time_spent_minutes: u64,
}

impl Certificate {
    /// Issue a certificate; fails unless every module is complete
    pub fn issue(course: &Course, state: &CourseState, learner: &str, issued_at: i64) -> Result<Self> {
        let aggregate = CourseProgressAggregate::compute(state);
        if !aggregate.certificate_eligible {
            return Err(TrackerError::NotEligible {
                course_id: course.id.clone(),
                completed: aggregate.completed_count,
                total: aggregate.total_modules,
            });
        }

        Ok(Self {
            course_id: course.id.clone(),
            course_title: course.title.clone(),
            learner: learner.to_string(),
            issued_at,
            modules_completed: aggregate.completed_count,
            average_quiz_score: aggregate.average_quiz_score,
            total_time_spent_minutes: aggregate.total_time_spent_minutes,
        })
    }

    /// Render as Markdown
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Certificate of Completion\n\n");
        out.push_str(&format!("This certifies that **{}** has completed\n\n", self.learner));
        out.push_str(&format!("## {}\n\n", self.course_title));
        out.push_str(&format!("- Modules completed: {}\n", self.modules_completed));
        out.push_str(&format!("- Average quiz score: {:.0}%\n", self.average_quiz_score));
        out.push_str(&format!("- Time invested: {}\n", format_minutes(self.total_time_spent_minutes)));
        out.push_str(&format!("- Issued: {} (unix time)\n", self.issued_at));
        out.push_str(&format!("- Certificate ID: {}-{}\n", self.course_id, self.issued_at));
        out
    }
}

/// Format minutes as `1h 05m` / `12m`
pub fn format_minutes(minutes: u64) -> String {
    if minutes >= 60 { format!("{}h {:02}m", minutes / 60, minutes % 60) } else { format!("{minutes}m") }
}

fn quote(text: &str) -> String {
    textwrap::wrap(text, WRAP_WIDTH - 2)
        .iter()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Achievement;

    fn course() -> Course {
        Course::new("safety", "Workplace Safety", ["Hazards", "Equipment"])
    }

    #[test]
    fn format_minutes_examples() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(59), "59m");
        assert_eq!(format_minutes(65), "1h 05m");
        assert_eq!(format_minutes(121), "2h 01m");
    }

    #[test]
    fn report_lists_modules_and_summary() {
        let course = course();
        let mut state = CourseState::new(&course);
        state.record_quiz_score("module-1", 90, 70).unwrap();
        state.add_time_spent("module-2", 30).unwrap();

        let report = render_report(&course, &state, &DiscussionBoard::default());
        assert!(report.starts_with("# Workplace Safety"));
        assert!(report.contains("Completion: 50% (1/2 modules)"));
        assert!(report.contains("| 1 | Hazards | yes | 90% | 0m |"));
        assert!(report.contains("| 2 | Equipment | no | - | 30m |"));
        assert!(!report.contains("## Achievements"));
        assert!(!report.contains("## Discussion"));
    }

    #[test]
    fn report_includes_badges_notes_and_discussion() {
        let course = course();
        let mut state = CourseState::new(&course);
        state.set_note("module-2", "Check the gloves").unwrap();
        state.achievements = [Achievement::FirstPost].into_iter().collect();
        let mut board = DiscussionBoard::default();
        let post_id = board.post("Dana", "Hello", 0).unwrap().id.clone();
        board.reply(&post_id, "Ana", "Hi Dana", 1).unwrap();

        let report = render_report(&course, &state, &board);
        assert!(report.contains("### Equipment"));
        assert!(report.contains("Check the gloves"));
        assert!(report.contains("**First Post**"));
        assert!(report.contains("> Hello"));
        assert!(report.contains("2 messages"));
        assert!(report.contains("**Dana** (1 replies)"));
    }

    #[test]
    fn certificate_requires_completion() {
        let course = course();
        let mut state = CourseState::new(&course);
        state.set_completion("module-1", true).unwrap();

        let err = Certificate::issue(&course, &state, "Dana", 0).unwrap_err();
        assert!(matches!(err, TrackerError::NotEligible { completed: 1, total: 2, .. }));
    }

    #[test]
    fn certificate_for_completed_course() {
        let course = course();
        let mut state = CourseState::new(&course);
        state.record_quiz_score("module-1", 100, 70).unwrap();
        state.record_quiz_score("module-2", 80, 70).unwrap();

        let certificate = Certificate::issue(&course, &state, "Dana", 1_700_000_000).unwrap();
        assert_eq!(certificate.modules_completed, 2);
        assert_eq!(certificate.average_quiz_score, 90.0);

        let markdown = certificate.to_markdown();
        assert!(markdown.contains("**Dana**"));
        assert!(markdown.contains("## Workplace Safety"));
        assert!(markdown.contains("Certificate ID: safety-1700000000"));
    }
}
