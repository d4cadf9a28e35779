use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coursetrack::app::{StudySession, View, summary_line, write_status};
use coursetrack::catalog::Catalog;
use coursetrack::config::session::Session;
use coursetrack::discussion::now_timestamp;
use coursetrack::export::{Certificate, render_report};
use coursetrack::store::FileStore;
use coursetrack::tracker::TrackerEvent;
use coursetrack::{Config, CourseTracker, ProgressRepository, TrackerError};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coursetrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List courses in the catalog
    Courses,
    /// Show progress for a course
    Status {
        /// Course id or title fragment
        course: String,
    },
    /// Mark a module complete
    Complete {
        course: String,
        /// Module id or number
        module: String,
        /// Mark the module incomplete instead
        #[arg(long)]
        undo: bool,
    },
    /// Record a quiz score for a module
    Quiz {
        course: String,
        module: String,
        /// Score between 0 and 100
        #[arg(allow_negative_numbers = true)]
        score: i32,
    },
    /// Replace a module's notes (empty text clears them)
    Note { course: String, module: String, text: String },
    /// Credit study minutes to a module
    LogTime {
        course: String,
        module: String,
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },
    /// Start a discussion in a course
    Post {
        course: String,
        content: String,
        /// Author name (defaults to the configured learner)
        #[arg(short, long)]
        author: Option<String>,
    },
    /// Reply to a discussion post
    Reply {
        course: String,
        post_id: String,
        content: String,
        #[arg(short, long)]
        author: Option<String>,
    },
    /// Show a course's discussion board
    Discussions { course: String },
    /// Export a Markdown progress report
    Export {
        course: String,
        /// Output path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Issue a completion certificate
    Certificate {
        course: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Start an interactive study session
    Study {
        /// Course to study (defaults to the last one opened)
        course: Option<String>,
    },
}

type Tracker = CourseTracker<FileStore>;

struct Workspace {
    config: Config,
    catalog: Catalog,
}

impl Workspace {
    fn load() -> Result<Self> {
        Ok(Self { config: Config::load()?, catalog: Catalog::load()? })
    }

    fn open(&self, query: &str) -> Result<(Tracker, mpsc::UnboundedReceiver<TrackerEvent>)> {
        let course = self
            .catalog
            .find(query)
            .cloned()
            .ok_or_else(|| TrackerError::UnknownCourse(query.to_string()))?;
        let store = FileStore::open(Config::store_dir()?)?;
        let repo = ProgressRepository::new(store, self.config.thresholds);
        Ok(CourseTracker::new(course, self.config.learner_name.clone(), repo))
    }

    fn module(&self, tracker: &Tracker, input: &str) -> Result<String> {
        let course = tracker.course();
        course.resolve_module(input).ok_or_else(|| {
            TrackerError::UnknownModule { course_id: course.id.clone(), module_id: input.to_string() }
                .into()
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursetrack=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let ctx = Workspace::load()?;

    match cli.command {
        Some(Commands::Courses) => list_courses(&ctx),
        Some(Commands::Status { course }) => {
            let (tracker, _events) = ctx.open(&course)?;
            write_status(&mut std::io::stdout(), tracker.course(), &tracker.state(), None)?;
        }
        Some(Commands::Complete { course, module, undo }) => {
            let (mut tracker, mut events) = ctx.open(&course)?;
            let module_id = ctx.module(&tracker, &module)?;
            tracker.on_set_completion(&module_id, !undo)?;
            print_events(&mut events);
        }
        Some(Commands::Quiz { course, module, score }) => {
            let (mut tracker, mut events) = ctx.open(&course)?;
            let module_id = ctx.module(&tracker, &module)?;
            tracker.on_submit_quiz(&module_id, score)?;
            print_events(&mut events);
        }
        Some(Commands::Note { course, module, text }) => {
            let (mut tracker, mut events) = ctx.open(&course)?;
            let module_id = ctx.module(&tracker, &module)?;
            tracker.on_note(&module_id, &text)?;
            print_events(&mut events);
        }
        Some(Commands::LogTime { course, module, minutes }) => {
            let (mut tracker, mut events) = ctx.open(&course)?;
            let module_id = ctx.module(&tracker, &module)?;
            tracker.on_add_time(&module_id, minutes)?;
            print_events(&mut events);
        }
        Some(Commands::Post { course, content, author }) => {
            let (mut tracker, mut events) = ctx.open(&course)?;
            let author = author.unwrap_or_else(|| ctx.config.learner_name.clone());
            let post = tracker.on_post_discussion(&author, &content)?;
            println!("Posted {}", post.id);
            print_events(&mut events);
        }
        Some(Commands::Reply { course, post_id, content, author }) => {
            let (mut tracker, mut events) = ctx.open(&course)?;
            let author = author.unwrap_or_else(|| ctx.config.learner_name.clone());
            let reply = tracker.on_reply(&post_id, &author, &content)?;
            println!("Replied {}", reply.id);
            print_events(&mut events);
        }
        Some(Commands::Discussions { course }) => {
            let (tracker, _events) = ctx.open(&course)?;
            print_discussions(&tracker);
        }
        Some(Commands::Export { course, output }) => {
            let (tracker, _events) = ctx.open(&course)?;
            let report = render_report(tracker.course(), &tracker.state(), &tracker.discussions());
            write_output(output, &report)?;
        }
        Some(Commands::Certificate { course, output }) => {
            let (tracker, _events) = ctx.open(&course)?;
            let certificate = Certificate::issue(
                tracker.course(),
                &tracker.state(),
                &ctx.config.learner_name,
                now_timestamp(),
            )?;
            write_output(output, &certificate.to_markdown())?;
        }
        Some(Commands::Study { course }) => study(&ctx, course).await?,
        None => study(&ctx, None).await?,
    }

    Ok(())
}

fn list_courses(ctx: &Workspace) {
    for course in ctx.catalog.list() {
        println!(
            "{:<24} {} ({}, {}, {} modules)",
            course.id,
            course.title,
            course.metadata.level,
            course.metadata.duration,
            course.module_count()
        );
    }
}

fn print_events(events: &mut mpsc::UnboundedReceiver<TrackerEvent>) {
    let mut latest = None;
    while let Ok(event) = events.try_recv() {
        match event {
            TrackerEvent::AchievementUnlocked(achievement) => {
                println!("Achievement unlocked: {} ({})", achievement.title(), achievement.description());
            }
            TrackerEvent::AggregateUpdated(aggregate) => latest = Some(aggregate),
        }
    }
    if let Some(aggregate) = latest {
        println!("{}", summary_line(&aggregate));
    }
}

fn print_discussions(tracker: &Tracker) {
    let board = tracker.discussions();
    if board.is_empty() {
        println!("No discussions yet in {}", tracker.course().title);
        return;
    }
    for post in &board.posts {
        println!("{} by {}", post.id, post.author);
        for line in textwrap::wrap(&post.content, 76) {
            println!("  {}", line);
        }
        for reply in &post.replies {
            println!("    {} by {}", reply.id, reply.author);
            for line in textwrap::wrap(&reply.content, 72) {
                println!("      {}", line);
            }
        }
    }
}

fn write_output(output: Option<PathBuf>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, contents)
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", contents),
    }
    Ok(())
}

async fn study(ctx: &Workspace, course: Option<String>) -> Result<()> {
    let mut session = Session::load()?;
    let Some(query) = course.or_else(|| session.current_course_id.clone()) else {
        println!("Pick a course to study: coursetrack study <course>\n");
        list_courses(ctx);
        return Ok(());
    };

    let (mut tracker, events) = ctx.open(&query)?;
    let course_id = tracker.course().id.clone();
    let saved = session.course(&course_id).cloned().unwrap_or_default();
    for module_id in &saved.expanded_modules {
        if let Err(e) = tracker.on_expand_module(module_id) {
            tracing::debug!("Not restoring {}: {}", module_id, e);
        }
    }

    let mut study = StudySession::new(tracker, events, ctx.config.tick_interval());
    if saved.on_content {
        study.set_view(View::Content);
    }
    study.run().await?;

    session.current_course_id = Some(course_id.clone());
    let course_session = session.course_mut(&course_id);
    course_session.expanded_modules = study.tracker().expanded_modules().clone();
    course_session.on_content = study.view() == View::Content;
    session.save()?;

    Ok(())
}
