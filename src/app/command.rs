//! Command parsing for the study session prompt

/// Parsed command from the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Expand a module: expand <module>
    Expand(String),
    /// Collapse a module: collapse <module>
    Collapse(String),
    /// Mark a module complete: complete <module>
    Complete(String),
    /// Mark a module incomplete: undo <module>
    Undo(String),
    /// Submit a quiz score: quiz <module> <score>
    Quiz { module: String, score: i32 },
    /// Replace module notes: note <module> <text>
    Note { module: String, text: String },
    /// Start a discussion: post <text>
    Post(String),
    /// Reply to a discussion: reply <post-id> <text>
    Reply { post_id: String, text: String },
    /// Switch to the content view (timer running): content
    Content,
    /// Switch to the overview (timer stopped): overview
    Overview,
    /// Print progress: status
    Status,
    /// Show help: help or ?
    Help,
    /// Leave the session: q or quit
    Quit,
    /// Empty input
    Nop,
}

/// Result of parsing a command
#[derive(Debug)]
pub enum ParseResult {
    /// Successfully parsed command
    Ok(Command),
    /// Unknown command
    UnknownCommand(String),
    /// Command needs an argument
    MissingArgument(String),
    /// Argument could not be parsed
    InvalidArgument(String),
}

/// Parse one line of input
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();
    let input = input.strip_prefix(':').unwrap_or(input);

    if input.is_empty() {
        return ParseResult::Ok(Command::Nop);
    }

    // Split into command and arguments
    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");

    match cmd.to_lowercase().as_str() {
        "expand" | "e" | "open" => single_arg("expand", args, Command::Expand),
        "collapse" | "c" | "close" => single_arg("collapse", args, Command::Collapse),
        "complete" | "done" | "m" => single_arg("complete", args, Command::Complete),
        "undo" | "incomplete" => single_arg("undo", args, Command::Undo),
        "quiz" => {
            let (module, rest) = split_first(args);
            if module.is_empty() || rest.is_empty() {
                return ParseResult::MissingArgument("quiz".to_string());
            }
            match rest.parse::<i32>() {
                Ok(score) => ParseResult::Ok(Command::Quiz { module: module.to_string(), score }),
                Err(_) => ParseResult::InvalidArgument(format!("quiz score '{}'", rest)),
            }
        }
        "note" | "n" => {
            let (module, text) = split_first(args);
            if module.is_empty() {
                ParseResult::MissingArgument("note".to_string())
            } else {
                ParseResult::Ok(Command::Note { module: module.to_string(), text: text.to_string() })
            }
        }
        "post" | "p" => single_arg("post", args, Command::Post),
        "reply" | "r" => {
            let (post_id, text) = split_first(args);
            if post_id.is_empty() || text.is_empty() {
                ParseResult::MissingArgument("reply".to_string())
            } else {
                ParseResult::Ok(Command::Reply { post_id: post_id.to_string(), text: text.to_string() })
            }
        }
        "content" => ParseResult::Ok(Command::Content),
        "overview" => ParseResult::Ok(Command::Overview),
        "status" | "s" => ParseResult::Ok(Command::Status),
        "help" | "h" | "?" => ParseResult::Ok(Command::Help),
        "quit" | "q" | "exit" => ParseResult::Ok(Command::Quit),
        _ => ParseResult::UnknownCommand(cmd.to_string()),
    }
}

fn single_arg(name: &str, args: &str, build: impl FnOnce(String) -> Command) -> ParseResult {
    if args.is_empty() {
        ParseResult::MissingArgument(name.to_string())
    } else {
        ParseResult::Ok(build(args.to_string()))
    }
}

fn split_first(args: &str) -> (&str, &str) {
    let mut parts = args.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().map(|s| s.trim()).unwrap_or("");
    (first, rest)
}

/// Help text for the prompt
pub const HELP: &str = "\
expand <module>          expand a module (time goes to the only expanded module)
collapse <module>        collapse a module
complete <module>        mark a module complete
undo <module>            mark a module incomplete
quiz <module> <score>    submit a quiz score (0-100)
note <module> <text>     replace the module's notes
post <text>              start a discussion
reply <post-id> <text>   reply to a discussion
content / overview       start / stop the session timer
status                   show progress
quit                     leave the session";
