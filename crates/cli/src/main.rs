mod cli;
mod config;
mod replay;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::info;

use spendwatch_alerts::{AlertMonitor, TracingSink};
use spendwatch_core::{config::load_dotenv, Budget, PeriodKey, SystemClock};
use spendwatch_storage::StorageBackend;

use crate::cli::{CliArgs, Command};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let config = config::resolve(&args).context("failed to resolve configuration")?;
    config.log_summary();

    let store_path = config
        .store_path
        .clone()
        .context("store path was not resolved")?;
    let store = StorageBackend::from_config(&config)
        .with_context(|| format!("failed to open alert store at {}", store_path.display()))?;
    let mut monitor = AlertMonitor::new(store, &config)
        .with_clock(Arc::new(SystemClock))
        .with_sink(Arc::new(TracingSink));

    let output = match args.command {
        Command::Check {
            budget_id,
            amount,
            period,
            previous,
            new,
        } => {
            let budget = match period {
                Some(raw) => Budget::new(budget_id, amount, PeriodKey::parse(&raw)?),
                None => Budget::for_current_period(budget_id, amount, &SystemClock),
            };
            let state = monitor.evaluate_spending_update(&budget, previous, new);
            json!({
                "budget": budget,
                "state": state,
                "fired": monitor.fired_in_last_update(),
            })
        }
        Command::Replay { file } => {
            let updates = replay::load_updates(&file)?;
            info!(count = updates.len(), "Replaying spending updates");
            json!(replay::replay(&mut monitor, &updates))
        }
        Command::Status { budget_id } => {
            json!({
                "budgetId": budget_id,
                "records": monitor.records_for_budget(&budget_id),
            })
        }
        Command::Reset { budget_id } => {
            let removed = monitor.reset_budget(&budget_id);
            json!({ "budgetId": budget_id, "removed": removed })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
