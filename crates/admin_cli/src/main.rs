use std::{error::Error, io::Write};

use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, MIN_PASSWORD_LEN, Money, NewGoal, NewUser};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

/// Demo goals as `(title, target, current, deadline)`, amounts in whole units.
const DEMO_GOALS: &[(&str, i64, i64, (i32, u32, u32))] = &[
    ("Buy a Car", 1_000_000, 250_000, (2026, 12, 31)),
    ("Vacation", 50_000, 15_000, (2025, 6, 30)),
    ("Summer", 100_000, 24_000, (2024, 12, 14)),
    ("World Tour", 200_000, 12_000, (2025, 12, 12)),
    ("Car Racing", 1_400_000, 240_000, (2024, 12, 14)),
    ("Sky Diving", 800_000, 28_000, (2024, 12, 14)),
    ("Bunjee Jumping", 200_000, 80_000, (2024, 12, 14)),
];

#[derive(Parser, Debug)]
#[command(name = "kharcha_admin")]
#[command(about = "Admin utilities for Kharcha (users, demo data, ledger repair)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./kharcha.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Goals(Goals),
    Ledger(Ledger),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: String,
}

#[derive(Args, Debug)]
struct Goals {
    #[command(subcommand)]
    command: GoalsCommand,
}

#[derive(Subcommand, Debug)]
enum GoalsCommand {
    /// Inserts a fixed set of demo goals for a user.
    Seed(OwnerArgs),
}

#[derive(Args, Debug)]
struct Ledger {
    #[command(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// Recomputes account balances from their transactions.
    Reconcile(OwnerArgs),
}

#[derive(Args, Debug)]
struct OwnerArgs {
    #[arg(long)]
    email: String,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn print_line(message: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(message),
        Print("\r\n")
    )?;
    Ok(())
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_new_password() -> Result<String, Box<dyn Error + Send + Sync>> {
    for _ in 0..3 {
        let first = prompt_password("Password: ")?;
        if first.chars().count() < MIN_PASSWORD_LEN {
            print_line(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters."
            ))?;
            continue;
        }

        let second = prompt_password("Confirm password: ")?;
        if first == second {
            return Ok(first);
        }
        print_line("Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn demo_goals() -> Result<Vec<NewGoal>, Box<dyn Error + Send + Sync>> {
    DEMO_GOALS
        .iter()
        .map(|&(title, target, current, (y, m, d))| {
            let deadline = NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
                .ok_or_else(|| format!("invalid deadline for {title}"))?;
            Ok(NewGoal::new(title, target * 100, deadline).current_amount_minor(current * 100))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if engine.user_by_email(&args.email).await.is_ok() {
                eprintln!("user already exists: {}", args.email);
                std::process::exit(1);
            }

            let password = prompt_new_password()?;
            let user = engine
                .register(NewUser::new(&args.email, password, &args.full_name))
                .await?;
            println!("created user: {} ({})", user.email, user.id);
        }
        Command::Goals(Goals {
            command: GoalsCommand::Seed(args),
        }) => {
            let user = engine.user_by_email(&args.email).await?;
            for goal in demo_goals()? {
                let goal = engine.create_goal(user.id, goal).await?;
                println!(
                    "seeded goal: {} ({} / {})",
                    goal.title,
                    Money::new(goal.current_amount_minor),
                    Money::new(goal.target_amount_minor)
                );
            }
        }
        Command::Ledger(Ledger {
            command: LedgerCommand::Reconcile(args),
        }) => {
            let user = engine.user_by_email(&args.email).await?;
            let drifts = engine.reconcile_balances(user.id).await?;
            if drifts.is_empty() {
                println!("all balances consistent");
            }
            for drift in drifts {
                println!(
                    "repaired {}: {} -> {}",
                    drift.account_id,
                    Money::new(drift.stored_minor),
                    Money::new(drift.expected_minor)
                );
            }
        }
    }

    Ok(())
}
