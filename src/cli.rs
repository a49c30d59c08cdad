use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "baraudit")]
#[command(about = "Bar-data reconciliation and continuity toolkit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile downloaded most-active records into the persisted files
    Reconcile {
        /// Snapshot CSV of freshly downloaded records (rank,product,date,ticker)
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Directory holding the persisted record files
        #[arg(short, long)]
        output: PathBuf,
        /// Also write and print the same-day subset
        #[arg(long)]
        today: bool,
        /// Start day relative to today (0 = today, 1 = yesterday)
        #[arg(short, long, default_value_t = 0)]
        day_offset: i64,
    },
    /// Check minute-bar continuity against trading sessions
    Doctor {
        /// Bar-data root (defaults to $DS_ROOT)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Trading date, YYYYMMDD
        #[arg(long)]
        date: String,
        /// Comma-separated ticker names to check (default: every file of the date)
        #[arg(long)]
        tickers: Option<String>,
        /// Restrict the check to one exchange
        #[arg(long)]
        exchange: Option<String>,
    },
    /// Show registry, calendar and session status for a data root
    Status {
        /// Bar-data root (defaults to $DS_ROOT)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Reconcile {
            snapshot,
            output,
            today,
            day_offset,
        } => {
            commands::reconcile::run(snapshot, output, today, day_offset);
        }
        Commands::Doctor {
            root,
            date,
            tickers,
            exchange,
        } => {
            commands::doctor::run(root, date, tickers, exchange);
        }
        Commands::Status { root } => {
            commands::status::run(root);
        }
    }
}
