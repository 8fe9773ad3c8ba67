use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Budget threshold alerts from the command line.
///
/// Evaluates spending updates against a monthly budget and persists which
/// thresholds already fired in a local JSON store.
#[derive(Parser, Debug)]
#[command(name = "spendwatch", version, about = "Budget threshold alerts")]
pub struct CliArgs {
    /// Path to the alert store file (default: <data dir>/spendwatch/alerts.json)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Message language: vi or en (unknown codes fall back to vi)
    #[arg(long, global = true)]
    pub lang: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a single spending update
    Check {
        #[arg(long)]
        budget_id: String,
        /// Monthly budget amount
        #[arg(long)]
        amount: f64,
        /// Accounting period, YYYY-MM (default: current month)
        #[arg(long)]
        period: Option<String>,
        /// Cumulative spend before the expense
        #[arg(long)]
        previous: f64,
        /// Cumulative spend after the expense
        #[arg(long)]
        new: f64,
    },

    /// Replay a JSON array of spending updates through one monitor
    Replay {
        /// File containing `[{"budget": {...}, "previousTotal": .., "newTotal": ..}, ...]`
        file: PathBuf,
    },

    /// Show persisted alert records for a budget
    Status {
        #[arg(long)]
        budget_id: String,
    },

    /// Clear persisted alert records for a budget
    Reset {
        #[arg(long)]
        budget_id: String,
    },
}
