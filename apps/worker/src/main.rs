mod config;
mod main_lib;
mod price_file;
mod scheduler;

use anyhow::Context;
use chrono::Duration as DayDuration;
use clap::{Parser, Subcommand};
use serde::Serialize;

use config::Config;
use main_lib::{build_state, init_tracing, AppState};

#[derive(Parser, Debug)]
#[command(name = "nestegg-worker")]
#[command(about = "Retirement fund valuation and daily snapshot worker")]
struct Cli {
    /// SQLite database path (overrides NESTEGG_DB_PATH).
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Value a user's holdings now and refresh the cached totals.
    Summarize { user_id: String },
    /// Capture today's snapshot for a user unless it already exists.
    Capture { user_id: String },
    /// Ensure baseline fund rows exist for a user.
    Backfill {
        user_id: String,
        /// Report what would be created without writing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print per-day snapshot totals.
    History {
        user_id: String,
        /// Number of days back from the current as-of day.
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// Run the capture scheduler until interrupted.
    Run,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_scheduler(state: std::sync::Arc<AppState>, config: &Config) -> anyhow::Result<()> {
    tracing::info!("Capturing snapshots for users in {}", state.db_path);
    let handle = scheduler::start_capture_scheduler(state, config.capture_interval);
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested; stopping scheduler");
    handle.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    init_tracing();
    let state = build_state(&config)?;

    match cli.command {
        Command::Summarize { user_id } => {
            print_json(&state.valuation_service.summarize(&user_id).await?)?;
        }
        Command::Capture { user_id } => {
            print_json(&state.snapshot_service.capture_if_absent(&user_id).await?)?;
        }
        Command::Backfill { user_id, dry_run } => {
            print_json(
                &state
                    .backfill_service
                    .backfill_base_funds(&user_id, dry_run)
                    .await?,
            )?;
        }
        Command::History { user_id, days } => {
            let end = state.valuation_service.current_as_of();
            let start = end - DayDuration::days(days.max(0));
            print_json(
                &state
                    .snapshot_service
                    .get_history(&user_id, Some(start), Some(end))?,
            )?;
        }
        Command::Run => run_scheduler(state, &config).await?,
    }
    Ok(())
}
