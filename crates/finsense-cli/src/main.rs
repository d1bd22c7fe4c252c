//! FinSense CLI - a command-line front end for the FinSense dashboard API.
//!
//! Every backend call goes through the authenticated gateway in
//! `finsense-core`; protected commands are checked by the route guard first,
//! exactly like protected views in the web front end.

mod commands;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use finsense_core::ApiError;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

/// When set, logs are also written to a daily rolling file in this directory
const LOG_DIR_ENV: &str = "FINSENSE_LOG_DIR";

/// Log file name prefix inside `FINSENSE_LOG_DIR`
const LOG_FILE_PREFIX: &str = "finsense.log";

#[derive(Parser)]
#[command(name = "finsense", version, about = "Personal finance dashboard in your terminal")]
pub struct Cli {
    /// Override the API base URL for this invocation
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a session token obtained from the login page
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Show account information
    Profile,
    /// Change the account password (prompts for input)
    ChangePassword,
    /// Permanently delete the account and all its data
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show or set the monthly budget
    Budget {
        #[command(subcommand)]
        action: BudgetAction,
    },
    /// List transactions
    Transactions {
        /// Only show `income` or `expense`
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Add a transaction, or edit one with --id
    AddTransaction {
        #[arg(long = "type", default_value = "expense")]
        kind: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        category: String,
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// Update this existing transaction instead of creating one
        #[arg(long)]
        id: Option<i64>,
    },
    /// Show the dashboard summary and insights
    Dashboard {
        /// Timeline granularity: daily, weekly or monthly
        #[arg(long, default_value = "monthly")]
        view: String,
    },
    /// Send a raw authenticated request and print the response
    Request {
        method: String,
        path: String,
        #[arg(long)]
        body: Option<String>,
    },
    /// Show what the route guard does for a path
    Route { path: String },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Show this month's budget and history
    Show,
    /// Set the budget for a month (defaults to the current month)
    Set {
        amount: f64,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
        /// Replace an existing budget for the month without asking
        #[arg(long)]
        yes: bool,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_guard = init_tracing();
    let cli = Cli::parse();
    info!("FinSense CLI starting");

    if let Err(e) = run(cli).await {
        report_error(&e);
        // Flush file logs before exiting
        drop(log_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app = commands::App::new(cli.base_url)?;
    app.dispatch(cli.command).await
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Unauthorized) => {
            eprintln!("Session expired, please log in again (finsense login --token ...)");
        }
        Some(ApiError::NoSession) => {
            eprintln!("Not logged in. Run `finsense login --token ...` first.");
        }
        Some(ApiError::Network(_)) => {
            eprintln!("{}. Please try again.", err);
        }
        _ => eprintln!("Error: {:#}", err),
    }
}
