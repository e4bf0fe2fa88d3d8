use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::QuestionBank;
use quiz_core::model::{CardState, QuizSettings, SessionRecord};
use quiz_core::scheduler::{AnswerOutcome, apply};
use quiz_storage::repository::Storage;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    cards: u32,
    records: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCards { raw: String },
    InvalidRecords { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCards { raw } => write!(f, "invalid --cards value: {raw}"),
            ArgsError::InvalidRecords { raw } => write!(f, "invalid --records value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3".into());
        let mut cards = env_u32("QUIZ_SEED_CARDS", 12);
        let mut records = env_u32("QUIZ_SEED_RECORDS", 3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--cards" => {
                    let value = require_value(&mut args, "--cards")?;
                    cards = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCards { raw: value.clone() })?;
                }
                "--records" => {
                    let value = require_value(&mut args, "--records")?;
                    records = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidRecords { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            cards,
            records,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p quiz-storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:quiz.sqlite3)");
    eprintln!("  --cards <n>               Questions to give a review history (default: 12)");
    eprintln!("  --records <n>             Session records to append (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_SEED_CARDS, QUIZ_SEED_RECORDS");
    eprintln!("  RUST_LOG controls log output (default: info)");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let bank = QuestionBank::bundled()?;
    let now = args.now.unwrap_or_else(Utc::now);

    // Every third question is answered wrong, so the seeded pool has due,
    // scheduled and untouched cards.
    let answered_at = now - Duration::days(3);
    let limit = usize::try_from(args.cards).unwrap_or(usize::MAX);
    for (i, question) in bank.all().iter().take(limit).enumerate() {
        let outcome = AnswerOutcome::from_correct(i % 3 != 2);
        let state = apply(&CardState::new(question.id()), outcome, answered_at);
        storage.cards.put_card(&state).await?;
    }

    for i in 0..args.records {
        let completed_at = now - Duration::days(i64::from(i) * 2);
        let record = SessionRecord::new(completed_at, 35 + i * 5, 3, 5, 4)?;
        let id = storage.history.append_record(&record).await?;
        info!(id, score = record.score(), "appended session record");
    }

    if storage.settings.get_settings().await?.is_none() {
        storage.settings.save_settings(&QuizSettings::default()).await?;
    }

    info!(
        cards = args.cards,
        records = args.records,
        db_url = %args.db_url,
        "seed complete"
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
