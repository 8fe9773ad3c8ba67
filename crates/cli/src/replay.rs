//! Batch replay of spending updates through a single monitor, so period
//! rollovers between updates behave as they would in a long-running host.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use spendwatch_alerts::{AlertMonitor, AlertState};
use spendwatch_core::Budget;
use spendwatch_storage::KeyValueStore;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingUpdate {
    pub budget: Budget,
    pub previous_total: f64,
    pub new_total: f64,
    /// Dismiss the surfaced alert after this update.
    #[serde(default)]
    pub dismiss: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    pub budget_id: String,
    pub period_key: String,
    pub fired: Vec<u32>,
    pub state: AlertState,
}

pub fn load_updates(path: &Path) -> Result<Vec<SpendingUpdate>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn replay<S: KeyValueStore>(
    monitor: &mut AlertMonitor<S>,
    updates: &[SpendingUpdate],
) -> Vec<ReplayStep> {
    updates
        .iter()
        .map(|update| {
            let state = monitor.evaluate_spending_update(
                &update.budget,
                update.previous_total,
                update.new_total,
            );
            let fired = monitor
                .fired_in_last_update()
                .iter()
                .map(|f| f.threshold)
                .collect();
            if update.dismiss {
                monitor.dismiss_alert();
            }
            ReplayStep {
                budget_id: update.budget.id.clone(),
                period_key: update.budget.period_key.to_string(),
                fired,
                state,
            }
        })
        .collect()
}
