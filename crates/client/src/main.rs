//! `wareops-console`: read-only views over the warehouse API.
//!
//! Needs `WAREOPS_API_URL` and `WAREOPS_AUTH_TOKEN`; the user id and roles
//! come from flags or `WAREOPS_USER_ID` / `WAREOPS_ROLES`.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use wareops_approvals::TicketType;
use wareops_client::{ClientConfig, SessionContext};
use wareops_core::{DateRange, UserId, WarehouseId};

const DEFAULT_DAYS: u32 = 30;

#[derive(Debug, Parser)]
#[command(name = "wareops-console")]
#[command(about = "Read-only views over the warehouse API")]
struct Cli {
    /// Signed-in user
    #[arg(long, env = "WAREOPS_USER_ID")]
    user_id: UserId,

    /// Server role names, comma separated
    #[arg(long, env = "WAREOPS_ROLES", value_delimiter = ',', default_value = "")]
    roles: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capacity summary and per-cabinet metrics of a warehouse
    Capacity {
        warehouse_id: WarehouseId,
    },

    /// Tickets of one type, grouped by document
    Tickets {
        #[arg(value_parser = parse_ticket_type)]
        ticket_type: TicketType,

        /// Look-back window in days
        #[arg(default_value_t = DEFAULT_DAYS)]
        days: u32,
    },

    /// Stocktakes still in progress
    Stocktakes {
        /// Look-back window in days
        #[arg(default_value_t = DEFAULT_DAYS)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    wareops_observability::init();

    let config = ClientConfig::from_env()?;
    let token = config
        .auth_token
        .clone()
        .context("WAREOPS_AUTH_TOKEN environment variable not set")?;
    let roles: Vec<&str> = cli
        .roles
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();

    let session = SessionContext::login(&config, token, cli.user_id, &roles)?;
    let outcome = run(&session, cli.command).await;
    session.teardown();
    outcome
}

async fn run(session: &SessionContext, command: Command) -> Result<()> {
    match command {
        Command::Capacity { warehouse_id } => {
            let capacity = session.capacity();
            let summary = capacity.load(warehouse_id).await?;
            let cabinets: Vec<_> = capacity.with_tree(|tree| {
                tree.cabinets()
                    .map(|c| serde_json::json!({"name": c.name(), "capacity": c.capacity(), "metrics": c.metrics()}))
                    .collect()
            });
            print_json(&serde_json::json!({"summary": summary, "cabinets": cabinets}))
        }
        Command::Tickets { ticket_type, days } => {
            let groups = session.approvals().refresh(ticket_type, trailing_range(days)).await?;
            print_json(&groups)
        }
        Command::Stocktakes { days } => {
            let checks = session.stocktake().in_progress(trailing_range(days)).await?;
            print_json(&checks)
        }
    }
}

fn parse_ticket_type(raw: &str) -> Result<TicketType, String> {
    TicketType::ALL
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(raw))
        .ok_or_else(|| format!("unknown ticket type: {raw}"))
}

fn trailing_range(days: u32) -> DateRange {
    DateRange::trailing_days(Utc::now().date_naive(), days)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
