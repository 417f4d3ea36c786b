use std::{error::Error, io::Write, path::PathBuf, sync::Arc};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{ChainLog, ChainStatus, Engine, users};
use ledger::{ChainLedger, Ledger, LedgerSettings};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "treasury_admin")]
#[command(about = "Admin utilities for the treasury service (users, notarization sweep)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./treasury.db?mode=rwc"
    )]
    database_url: String,

    #[command(flatten)]
    ledger: LedgerArgs,

    #[command(subcommand)]
    command: Command,
}

/// Only `chain-log retry` talks to the node.
#[derive(Args, Debug)]
struct LedgerArgs {
    #[arg(long, env = "BLOCKCHAIN_RPC", default_value = "http://localhost:8545")]
    rpc_url: String,
    #[arg(long, env = "TREASURY_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,
    #[arg(
        long,
        env = "TREASURY_CONTRACT_FILE",
        default_value = "contracts/TreasuryLogger.json"
    )]
    contract_file: PathBuf,
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,
}

impl From<LedgerArgs> for LedgerSettings {
    fn from(args: LedgerArgs) -> Self {
        LedgerSettings {
            rpc_url: args.rpc_url,
            private_key: args.private_key,
            contract_file: args.contract_file,
            timeout_secs: args.timeout_secs,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Treasury(Treasury),
    #[command(name = "chain-log")]
    ChainLog(ChainLogArgs),
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
    username: String,
    #[arg(long)]
    email: Option<String>,
}

#[derive(Args, Debug)]
struct Treasury {
    #[command(subcommand)]
    command: TreasuryCommand,
}

#[derive(Subcommand, Debug)]
enum TreasuryCommand {
    Create(TreasuryCreateArgs),
}

#[derive(Args, Debug)]
struct TreasuryCreateArgs {
    /// Becomes the first admin.
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct ChainLogArgs {
    #[command(subcommand)]
    command: ChainLogCommand,
}

#[derive(Subcommand, Debug)]
enum ChainLogCommand {
    /// Lists chain logs, oldest first.
    List {
        /// Comma-separated statuses.
        #[arg(long, default_value = "none,pending,failed")]
        status: String,
    },
    /// Moves a log stuck in `pending` to `failed`.
    Release {
        transaction_id: Uuid,
        #[arg(long, default_value = "released by operator")]
        reason: String,
    },
    /// Claims a `none` or `failed` log and notarizes it in this process.
    Retry { transaction_id: Uuid },
}

fn parse_statuses(raw: &str) -> Result<Vec<ChainStatus>, Box<dyn Error + Send + Sync>> {
    let statuses = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ChainStatus::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    if statuses.is_empty() {
        return Err(format!("no status given: {raw}").into());
    }
    Ok(statuses)
}

fn print_log(log: &ChainLog) {
    println!(
        "{}  tx={}  {:<7}  updated={}  hash={}  error={}",
        log.id,
        log.transaction_id,
        log.status.as_str(),
        log.updated_at.to_rfc3339(),
        log.tx_hash.as_deref().unwrap_or("-"),
        log.error_detail.as_deref().unwrap_or("-"),
    );
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

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
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

async fn build_engine(
    db: &DatabaseConnection,
    ledger: Arc<dyn Ledger>,
) -> Result<Engine, Box<dyn Error + Send + Sync>> {
    Ok(Engine::builder()
        .database(db.clone())
        .ledger(ledger)
        .workers(1)
        .build()
        .await?)
}

fn offline_ledger() -> Arc<dyn Ledger> {
    Arc::new(ChainLedger::disabled("admin command without ledger access"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if users::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }

            let password = prompt_password_twice()?;

            let user = users::ActiveModel {
                username: Set(args.username.clone()),
                password: Set(password),
                email: Set(args.email),
            };
            users::Entity::insert(user).exec(&db).await?;

            println!("created user: {}", args.username);
        }
        Command::Treasury(Treasury {
            command: TreasuryCommand::Create(args),
        }) => {
            let engine = build_engine(&db, offline_ledger()).await?;
            let treasury = engine
                .create_treasury(&args.owner, &args.name, args.description.as_deref())
                .await?;
            println!(
                "created treasury: {} ({}) address {}",
                treasury.name, treasury.id, treasury.chain_address
            );
        }
        Command::ChainLog(ChainLogArgs { command }) => match command {
            ChainLogCommand::List { status } => {
                let statuses = parse_statuses(&status)?;
                let engine = build_engine(&db, offline_ledger()).await?;
                let logs = engine.chain_logs_by_status(&statuses).await?;
                for log in &logs {
                    print_log(log);
                }
                println!("{} chain log(s)", logs.len());
            }
            ChainLogCommand::Release {
                transaction_id,
                reason,
            } => {
                let engine = build_engine(&db, offline_ledger()).await?;
                let log = engine
                    .release_stuck_notarization(transaction_id, &reason)
                    .await?;
                print_log(&log);
            }
            ChainLogCommand::Retry { transaction_id } => {
                let ledger = ChainLedger::connect(&cli.ledger.into()).await?;
                if !ledger.is_ready() {
                    eprintln!("ledger is not configured, refusing to retry");
                    std::process::exit(2);
                }
                let engine = build_engine(&db, Arc::new(ledger)).await?;
                let job = engine.claim_notarization(transaction_id).await?;
                let log = engine.notarizer().run(job).await?;
                print_log(&log);
                if log.status == ChainStatus::Failed {
                    std::process::exit(1);
                }
            }
        },
    }

    Ok(())
}
