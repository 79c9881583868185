use std::fmt;
use std::sync::Arc;

use guide_core::condition::ConditionOutcome;
use guide_core::model::{ChallengeIndex, CompletionStatus, ProgressSnapshot, SectionId};
use guide_core::{GuideConfigDraft, SectionLayout};
use services::{Clock, GuideServices, PresentationAdapter};
use tracing_subscriber::EnvFilter;

/// Height used to lay out sections when driving scroll events from the shell.
const SECTION_HEIGHT: f64 = 800.0;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingOperand { command: &'static str },
    UnexpectedOperand(String),
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidMargin { raw: String },
    InvalidPosition { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingOperand { command } => write!(f, "{command} requires an argument"),
            ArgsError::UnexpectedOperand(arg) => write!(f, "unexpected argument: {arg}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidMargin { raw } => write!(f, "invalid --margin value: {raw}"),
            ArgsError::InvalidPosition { raw } => write!(f, "invalid scroll position: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- status             [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- scroll <position>  [--db <sqlite_url>] [--margin <units>]");
    eprintln!("  cargo run -p app -- visit <section>    [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- complete <index>   [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- label [<text>]     [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- claim              [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- reset              [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- eval <condition>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:guide.sqlite3");
    eprintln!("  --margin 200");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GUIDE_DB_URL, GUIDE_ACTIVATION_MARGIN, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Status,
    Scroll(f64),
    Visit(String),
    Complete(String),
    Label(Option<String>),
    Claim,
    Reset,
    Eval(String),
}

struct Args {
    command: Command,
    db_url: String,
    margin: Option<f64>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let name = args.next().unwrap_or_else(|| "status".into());
        if matches!(name.as_str(), "--help" | "-h") {
            print_usage();
            std::process::exit(0);
        }

        let mut db_url = std::env::var("GUIDE_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("guide.sqlite3".into()), normalize_sqlite_url);
        let mut margin = match std::env::var("GUIDE_ACTIVATION_MARGIN") {
            Ok(raw) => Some(parse_margin(raw)?),
            Err(_) => None,
        };
        let mut operands = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--margin" => {
                    margin = Some(parse_margin(require_value(&mut args, "--margin")?)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => operands.push(arg),
            }
        }

        let command = Command::from_parts(&name, operands)?;
        Ok(Self {
            command,
            db_url,
            margin,
        })
    }
}

impl Command {
    fn from_parts(name: &str, operands: Vec<String>) -> Result<Self, ArgsError> {
        let mut operands = operands.into_iter();
        let command = match name {
            "status" => Self::Status,
            "claim" => Self::Claim,
            "reset" => Self::Reset,
            "scroll" => {
                let raw = operands
                    .next()
                    .ok_or(ArgsError::MissingOperand { command: "scroll" })?;
                let position = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or(ArgsError::InvalidPosition { raw })?;
                Self::Scroll(position)
            }
            "visit" => Self::Visit(
                operands
                    .next()
                    .ok_or(ArgsError::MissingOperand { command: "visit" })?,
            ),
            "complete" => Self::Complete(
                operands
                    .next()
                    .ok_or(ArgsError::MissingOperand { command: "complete" })?,
            ),
            "label" => Self::Label(operands.next()),
            "eval" => {
                let expr = operands.collect::<Vec<_>>().join(" ");
                if expr.trim().is_empty() {
                    return Err(ArgsError::MissingOperand { command: "eval" });
                }
                return Ok(Self::Eval(expr));
            }
            other => return Err(ArgsError::UnknownCommand(other.to_string())),
        };

        match operands.next() {
            Some(extra) => Err(ArgsError::UnexpectedOperand(extra)),
            None => Ok(command),
        }
    }
}

fn parse_margin(raw: String) -> Result<f64, ArgsError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ArgsError::InvalidMargin { raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Prints transitions as the session reports them.
struct TerminalAdapter;

impl PresentationAdapter for TerminalAdapter {
    fn on_active_section_changed(&self, section: SectionId) {
        println!("now exploring: {section}");
    }

    fn on_completion_status_changed(&self, status: CompletionStatus) {
        if status.unlocked {
            println!("all {} challenges complete, reward unlocked", status.quota);
        } else {
            println!(
                "challenges complete: {}/{} ({} to go)",
                status.completed_count,
                status.quota,
                status.remaining()
            );
        }
    }
}

fn print_snapshot(snapshot: &ProgressSnapshot) {
    let active = snapshot
        .active_section()
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    println!("visitor:    {}", snapshot.record.visitor_label().unwrap_or("-"));
    println!("active:     {active}");
    println!(
        "visited:    {}/{}",
        snapshot.visited_count(),
        snapshot.total_sections()
    );
    for (id, seen) in snapshot.record.visited_sections() {
        println!("  [{}] {id}", if *seen { "x" } else { " " });
    }
    println!(
        "challenges: {}/{}{}",
        snapshot.completion.completed_count,
        snapshot.completion.quota,
        if snapshot.completion.unlocked {
            " (reward unlocked)"
        } else {
            ""
        }
    );
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if let Command::Eval(expr) = &args.command {
        let outcome = ConditionOutcome::evaluate(expr).map_err(guide_core::Error::from)?;
        println!("{expr} => {}", outcome.value);
        println!("{}", outcome.action());
        return Ok(());
    }

    let config = GuideConfigDraft {
        activation_margin: args.margin,
        ..GuideConfigDraft::default()
    }
    .validate()
    .map_err(guide_core::Error::from)?;

    if let Err(err) = prepare_sqlite_file(&args.db_url) {
        tracing::warn!(db_url = %args.db_url, error = %err, "could not prepare database file");
    }
    let services = GuideServices::new_sqlite(&args.db_url, Clock::system(), config).await;

    if args.command == Command::Reset {
        services.progress().reset().await?;
        println!("progress cleared");
        return Ok(());
    }

    let (handle, task) = services.spawn_session(Arc::new(TerminalAdapter)).await;
    match args.command {
        Command::Status => print_snapshot(&handle.snapshot().await?),
        Command::Scroll(position) => {
            handle
                .set_layout(SectionLayout::uniform(SECTION_HEIGHT).candidates().to_vec())
                .await?;
            match handle.scroll(position).await? {
                Some(section) => println!("section at {position}: {section}"),
                None => println!("no section reached at {position}"),
            }
        }
        Command::Visit(raw) => {
            let section = handle.activate_section(raw).await?;
            println!("visited: {section}");
        }
        Command::Complete(raw) => {
            let index: ChallengeIndex = raw.parse().map_err(guide_core::Error::from)?;
            let status = handle.toggle_challenge(i64::from(index.value()), true).await?;
            println!(
                "challenges complete: {}/{}",
                status.completed_count, status.quota
            );
        }
        Command::Label(label) => {
            if handle.set_visitor_label(label).await? {
                println!("visitor label updated");
            }
        }
        Command::Claim => {
            let reward = handle.claim_reward().await?;
            let who = reward.visitor_label.as_deref().unwrap_or("explorer");
            println!("{}: {} earned {}", reward.quest_title, who, reward.reward);
        }
        Command::Reset | Command::Eval(_) => {}
    }

    drop(handle);
    task.await?;
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
