use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};
use engine::{Engine, EngineError};
use migration::MigratorTrait;
use sea_orm::Database;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "eventbuddy_admin")]
#[command(about = "Admin utilities for EventBuddy (users, events, RSVPs)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./eventbuddy.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Event(EventCommand),
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register a user. The password is prompted unless `--password` is given.
    Create(UserCreateArgs),
    List,
    /// Delete a user and every RSVP it holds.
    Delete(IdArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    Create(EventCreateArgs),
    List,
    /// Delete an event and every RSVP to it.
    Delete(IdArgs),
    /// List the RSVPs of an event.
    Rsvps(IdArgs),
}

#[derive(Args, Debug)]
struct EventCreateArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    max_seats: i32,
}

#[derive(Args, Debug)]
struct IdArgs {
    #[arg(long)]
    id: i32,
}

/// Keeps the terminal in raw mode while alive.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn print_line(out: &mut std::io::Stderr, text: &str) -> CliResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(text),
        Print("\r\n")
    )?;
    out.flush()?;
    Ok(())
}

/// Read one line from the terminal, echoing `*` for every character.
fn read_masked(prompt: &str) -> CliResult<String> {
    let _raw = RawModeGuard::enter()?;
    let mut out = std::io::stderr();
    execute!(out, cursor::MoveToColumn(0), Print(prompt))?;
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
            KeyCode::Enter => break,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Backspace if buf.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => continue,
        }
        out.flush()?;
    }

    execute!(out, Print("\r\n"))?;
    out.flush()?;
    Ok(buf)
}

fn prompt_new_password() -> CliResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let first = read_masked("Password: ")?;
        if first.is_empty() {
            print_line(&mut out, "Password must not be empty.")?;
            continue;
        }
        if read_masked("Confirm password: ")? == first {
            return Ok(first);
        }
        print_line(&mut out, "Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

async fn connect_engine(database_url: &str) -> CliResult<Engine> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Engine::builder().database(db).build().await?)
}

async fn run_user(engine: &Engine, command: UserCommand) -> CliResult<()> {
    match command {
        UserCommand::Create(args) => {
            let password = match args.password {
                Some(password) => password,
                None => prompt_new_password()?,
            };
            let user = engine
                .register_user(&args.name, &args.email, &password)
                .await?;
            println!("created user {}: {} <{}>", user.id, user.name, user.email);
        }
        UserCommand::List => {
            for user in engine.list_users().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    user.id,
                    user.name,
                    user.email,
                    user.created_at.to_rfc3339()
                );
            }
        }
        UserCommand::Delete(IdArgs { id }) => {
            engine.delete_user(id).await?;
            println!("deleted user {id}");
        }
    }
    Ok(())
}

async fn run_event(engine: &Engine, command: EventCommand) -> CliResult<()> {
    match command {
        EventCommand::Create(args) => {
            let event = engine
                .create_event(&args.title, args.description.as_deref(), args.max_seats)
                .await?;
            println!(
                "created event {}: {} ({} seats)",
                event.id, event.title, event.max_seats
            );
        }
        EventCommand::List => {
            for event in engine.list_events().await? {
                let taken = engine.list_rsvps(event.id).await?.len();
                println!(
                    "{}\t{}\t{}/{}",
                    event.id, event.title, taken, event.max_seats
                );
            }
        }
        EventCommand::Delete(IdArgs { id }) => {
            engine.delete_event(id).await?;
            println!("deleted event {id}");
        }
        EventCommand::Rsvps(IdArgs { id }) => {
            for rsvp in engine.list_rsvps(id).await? {
                println!(
                    "{}\tuser {}\t{}",
                    rsvp.id,
                    rsvp.user_id,
                    rsvp.created_at.to_rfc3339()
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let engine = connect_engine(&cli.database_url).await?;

    let outcome = match cli.command {
        Command::User(command) => run_user(&engine, command).await,
        Command::Event(command) => run_event(&engine, command).await,
    };

    if let Err(err) = outcome {
        eprintln!("{err}");
        let code = match err.downcast_ref::<EngineError>() {
            Some(EngineError::NotFound(..)) => 3,
            Some(EngineError::InvalidInput(_) | EngineError::DuplicateEmail(_)) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }

    Ok(())
}
