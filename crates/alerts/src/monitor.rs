//! Alert state machine.
//!
//! Per spending update the monitor evaluates every configured threshold in
//! ascending order against the persisted trigger flag, persists each one that
//! fires, and surfaces the last one fired. Visibility moves `hidden -> shown`
//! only when a threshold fires and `shown -> hidden` only on dismissal.
//!
//! Trigger truth lives in the store and is re-read every evaluation, and so
//! does the period each budget's records belong to. A budget seen under a new
//! period has its records cleared before any threshold is checked, whether
//! or not this monitor saw the old period itself. The monitor only remembers
//! the last budget it saw and the currently surfaced alert.
//!
//! Callers must invoke the monitor sequentially per budget. Two concurrent
//! updates for the same budget can both observe an untriggered record and
//! fire twice.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use spendwatch_core::{AlertConfig, Budget, Clock, Language, SystemClock};
use spendwatch_storage::KeyValueStore;

use crate::diagnostics::DiagnosticSink;
use crate::evaluator::evaluate;
use crate::formatter::MessageFormatter;
use crate::store::{AlertRecord, AlertStore};

/// Visual weight of a surfaced alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// 100% is an error, every other threshold a warning.
    pub fn for_threshold(threshold: u32) -> Self {
        if threshold == 100 {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// What the UI layer should show.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertState {
    pub alert_visible: bool,
    pub message: Option<String>,
    pub severity: Option<Severity>,
    pub active_threshold: Option<u32>,
}

/// A threshold that fired during one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiredAlert {
    pub threshold: u32,
    pub message: String,
    pub severity: Severity,
    /// Whether the trigger record reached the store. When false the same
    /// crossing will fire again on the next evaluation.
    pub persisted: bool,
}

pub struct AlertMonitor<S> {
    store: AlertStore<S>,
    formatter: MessageFormatter,
    clock: Arc<dyn Clock>,
    thresholds: Vec<u32>,
    language: Language,
    last_budget_id: Option<String>,
    state: AlertState,
    last_fired: Vec<FiredAlert>,
}

impl<S: KeyValueStore> AlertMonitor<S> {
    pub fn new(store: S, config: &AlertConfig) -> Self {
        let mut thresholds = config.thresholds.clone();
        thresholds.sort_unstable();
        thresholds.dedup();
        Self {
            store: AlertStore::new(store, config.namespace.clone()),
            formatter: MessageFormatter::new(),
            clock: Arc::new(SystemClock),
            thresholds,
            language: config.language,
            last_budget_id: None,
            state: AlertState::default(),
            last_fired: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.store = self.store.with_sink(sink);
        self
    }

    /// Evaluate one spending update and return the alert to surface.
    ///
    /// `previous_total` and `new_total` are the cumulative spend for the
    /// budget's period before and after the expense event.
    pub fn evaluate_spending_update(
        &mut self,
        budget: &Budget,
        previous_total: f64,
        new_total: f64,
    ) -> AlertState {
        self.observe(budget);
        self.last_fired.clear();

        for &threshold in &self.thresholds {
            let already_triggered = self.store.get(&budget.id, threshold).triggered;
            let fires = evaluate(
                previous_total,
                new_total,
                budget.amount,
                f64::from(threshold),
                already_triggered,
            );
            debug!(
                budget_id = %budget.id,
                threshold,
                previous_total,
                new_total,
                already_triggered,
                fires,
                "Threshold evaluated"
            );
            if !fires {
                continue;
            }

            let persisted = self
                .store
                .set(&budget.id, threshold, true, Some(self.clock.now()));
            if !persisted {
                warn!(budget_id = %budget.id, threshold, "Alert fired but trigger record was not persisted");
            }

            let message = self
                .formatter
                .format(new_total, budget.amount, threshold, self.language);
            let severity = Severity::for_threshold(threshold);
            info!(budget_id = %budget.id, threshold, severity = severity.as_str(), "Budget alert fired");

            // Later (higher) thresholds overwrite the surfaced alert.
            self.state = AlertState {
                alert_visible: true,
                message: Some(message.clone()),
                severity: Some(severity),
                active_threshold: Some(threshold),
            };
            self.last_fired.push(FiredAlert {
                threshold,
                message,
                severity,
                persisted,
            });
        }

        self.state.clone()
    }

    /// Evaluate against a budget scoped to the clock's current period.
    pub fn evaluate_for_current_period(
        &mut self,
        budget_id: &str,
        budget_amount: f64,
        previous_total: f64,
        new_total: f64,
    ) -> AlertState {
        let budget = Budget::for_current_period(budget_id, budget_amount, self.clock.as_ref());
        self.evaluate_spending_update(&budget, previous_total, new_total)
    }

    /// Hide the surfaced alert. Persisted trigger records are untouched, so
    /// the same crossing will not surface again.
    pub fn dismiss_alert(&mut self) {
        if self.state.alert_visible {
            debug!(threshold = ?self.state.active_threshold, "Alert dismissed");
        }
        self.state.alert_visible = false;
    }

    /// Clear every trigger record of `budget_id`, allowing all thresholds to
    /// fire again. A surfaced alert stays until dismissed.
    pub fn reset_budget(&mut self, budget_id: &str) -> usize {
        let removed = self.store.delete_all_for_budget(budget_id);
        info!(budget_id = %budget_id, removed, "Alert records cleared");
        removed
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    /// Every threshold fired by the most recent evaluation, ascending.
    pub fn fired_in_last_update(&self) -> &[FiredAlert] {
        &self.last_fired
    }

    pub fn records_for_budget(&self, budget_id: &str) -> Vec<AlertRecord> {
        self.store.records_for_budget(budget_id)
    }

    pub fn thresholds(&self) -> &[u32] {
        &self.thresholds
    }

    pub fn alert_store(&self) -> &AlertStore<S> {
        &self.store
    }

    /// Compare the budget's period against the one its records were written
    /// under. A different period clears the records; an unseen budget only
    /// gets its marker written. Visibility is left alone either way.
    fn observe(&mut self, budget: &Budget) {
        match self.store.period_marker(&budget.id) {
            Some(seen) if seen == budget.period_key => {}
            Some(seen) => {
                let removed = self.store.delete_all_for_budget(&budget.id);
                info!(
                    budget_id = %budget.id,
                    from = %seen,
                    to = %budget.period_key,
                    removed,
                    "Accounting period changed, alert records cleared"
                );
                self.mark_period(budget);
            }
            None => self.mark_period(budget),
        }

        if self
            .last_budget_id
            .as_deref()
            .is_some_and(|id| id != budget.id)
        {
            debug!(
                from = %self.last_budget_id.as_deref().unwrap_or_default(),
                to = %budget.id,
                "Budget changed"
            );
        }
        self.last_budget_id = Some(budget.id.clone());
    }

    fn mark_period(&self, budget: &Budget) {
        if !self.store.set_period_marker(&budget.id, &budget.period_key) {
            warn!(
                budget_id = %budget.id,
                period = %budget.period_key,
                "Period marker not persisted, rollover may go undetected"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use spendwatch_core::{FixedClock, PeriodKey};
    use spendwatch_storage::MemoryStore;

    use super::*;

    const AMOUNT: f64 = 15_000_000.0;

    fn monitor() -> AlertMonitor<MemoryStore> {
        AlertMonitor::new(MemoryStore::new(), &AlertConfig::default())
            .with_clock(Arc::new(FixedClock::at_ymd(2026, 1, 15).unwrap()))
    }

    fn budget(id: &str, period: &str) -> Budget {
        Budget::new(id, AMOUNT, period)
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(Severity::for_threshold(100), Severity::Error);
        assert_eq!(Severity::for_threshold(80), Severity::Warning);
        assert_eq!(Severity::for_threshold(50), Severity::Warning);
    }

    #[test]
    fn crossing_80_surfaces_warning_and_persists() {
        let mut m = monitor();
        let state = m.evaluate_spending_update(&budget("b1", "2026-01"), 11_000_000.0, 12_500_000.0);

        assert!(state.alert_visible);
        assert_eq!(state.active_threshold, Some(80));
        assert_eq!(state.severity, Some(Severity::Warning));
        assert!(state.message.unwrap().contains("83%"));

        let record = m.alert_store().get("b1", 80);
        assert!(record.triggered);
        assert_eq!(record.fired_at, Some(Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap()));
    }

    #[test]
    fn same_crossing_fires_once() {
        let mut m = monitor();
        let b = budget("b1", "2026-01");
        m.evaluate_spending_update(&b, 11_000_000.0, 12_500_000.0);
        m.dismiss_alert();

        let state = m.evaluate_spending_update(&b, 11_000_000.0, 12_500_000.0);
        assert!(!state.alert_visible);
        assert!(m.fired_in_last_update().is_empty());
    }

    #[test]
    fn jump_past_both_thresholds_surfaces_100() {
        let mut m = monitor();
        let state = m.evaluate_spending_update(&budget("b1", "2026-01"), 1_000_000.0, 16_000_000.0);

        assert_eq!(state.active_threshold, Some(100));
        assert_eq!(state.severity, Some(Severity::Error));
        assert!(state.message.unwrap().contains("1,000,000đ"));

        let fired: Vec<u32> = m.fired_in_last_update().iter().map(|f| f.threshold).collect();
        assert_eq!(fired, vec![80, 100]);
        assert!(m.alert_store().get("b1", 80).triggered);
        assert!(m.alert_store().get("b1", 100).triggered);
    }

    #[test]
    fn dismissal_keeps_records() {
        let mut m = monitor();
        let b = budget("b1", "2026-01");
        m.evaluate_spending_update(&b, 11_000_000.0, 12_500_000.0);
        m.dismiss_alert();

        assert!(!m.state().alert_visible);
        assert!(m.alert_store().get("b1", 80).triggered);

        // 100% still fires independently.
        let state = m.evaluate_spending_update(&b, 12_500_000.0, 15_000_000.0);
        assert!(state.alert_visible);
        assert_eq!(state.active_threshold, Some(100));
    }

    #[test]
    fn visible_alert_stays_until_dismissed() {
        let mut m = monitor();
        let b = budget("b1", "2026-01");
        m.evaluate_spending_update(&b, 11_000_000.0, 12_500_000.0);

        let state = m.evaluate_spending_update(&b, 12_500_000.0, 13_000_000.0);
        assert!(state.alert_visible);
        assert_eq!(state.active_threshold, Some(80));
    }

    #[test]
    fn period_change_clears_records() {
        let mut m = monitor();
        m.evaluate_spending_update(&budget("b1", "2026-01"), 11_000_000.0, 12_500_000.0);

        let state = m.evaluate_spending_update(&budget("b1", "2026-02"), 11_000_000.0, 12_500_000.0);
        assert!(state.alert_visible);
        assert_eq!(state.active_threshold, Some(80));
    }

    #[test]
    fn period_change_keeps_alert_until_dismissed() {
        let mut m = monitor();
        m.evaluate_spending_update(&budget("b1", "2026-01"), 11_000_000.0, 12_500_000.0);

        let state = m.evaluate_spending_update(&budget("b1", "2026-02"), 0.0, 1_000.0);
        assert!(state.alert_visible);
        assert_eq!(state.active_threshold, Some(80));
        assert!(m.fired_in_last_update().is_empty());
        assert!(!m.alert_store().get("b1", 80).triggered);

        m.dismiss_alert();
        assert!(!m.state().alert_visible);
    }

    #[test]
    fn budget_change_keeps_alert_until_dismissed() {
        let mut m = monitor();
        m.evaluate_spending_update(&budget("b1", "2026-01"), 11_000_000.0, 12_500_000.0);

        let state = m.evaluate_spending_update(&budget("b2", "2026-01"), 0.0, 1.0);
        assert!(state.alert_visible);
        assert_eq!(state.active_threshold, Some(80));
    }

    #[test]
    fn interleaved_budgets_roll_over_independently() {
        let mut m = monitor();
        let state = m.evaluate_spending_update(&budget("b1", "2026-01"), 11_000_000.0, 12_500_000.0);
        assert!(state.alert_visible);
        m.dismiss_alert();

        m.evaluate_spending_update(&budget("b2", "2026-02"), 0.0, 1_000.0);
        assert!(m.alert_store().get("b1", 80).triggered);

        let state = m.evaluate_spending_update(&budget("b1", "2026-02"), 11_000_000.0, 12_500_000.0);
        assert!(state.alert_visible);
        assert_eq!(state.active_threshold, Some(80));
        assert_eq!(m.alert_store().period_marker("b1"), Some(PeriodKey::from("2026-02")));
    }

    #[test]
    fn rollover_detected_by_a_fresh_monitor() {
        let store = Arc::new(MemoryStore::new());
        let mut first = AlertMonitor::new(store.clone(), &AlertConfig::default());
        first.evaluate_spending_update(&budget("b1", "2026-01"), 11_000_000.0, 12_500_000.0);

        let mut second = AlertMonitor::new(store, &AlertConfig::default());
        let state = second.evaluate_spending_update(&budget("b1", "2026-02"), 11_000_000.0, 12_500_000.0);
        assert!(state.alert_visible);
        assert_eq!(state.active_threshold, Some(80));
    }

    #[test]
    fn same_period_survives_a_fresh_monitor() {
        let store = Arc::new(MemoryStore::new());
        let mut first = AlertMonitor::new(store.clone(), &AlertConfig::default());
        first.evaluate_spending_update(&budget("b1", "2026-01"), 11_000_000.0, 12_500_000.0);

        // A fresh monitor over the same store, e.g. after an app restart.
        let mut second = AlertMonitor::new(store, &AlertConfig::default());
        let state = second.evaluate_spending_update(&budget("b1", "2026-01"), 11_000_000.0, 12_500_000.0);
        assert!(!state.alert_visible);
    }

    #[test]
    fn budget_change_keeps_old_records() {
        let mut m = monitor();
        m.evaluate_spending_update(&budget("b1", "2026-01"), 11_000_000.0, 12_500_000.0);

        let state = m.evaluate_spending_update(&budget("b2", "2026-01"), 11_000_000.0, 12_500_000.0);
        assert!(state.alert_visible);
        assert!(m.alert_store().get("b1", 80).triggered);
        assert!(m.alert_store().get("b2", 80).triggered);
    }

    #[test]
    fn unconfigured_budget_never_alerts() {
        let mut m = monitor();
        let state = m.evaluate_spending_update(&Budget::new("b1", 0.0, "2026-01"), 0.0, 1e9);
        assert_eq!(state, AlertState::default());
        assert!(m.records_for_budget("b1").is_empty());
    }

    #[test]
    fn reset_budget_allows_refire() {
        let mut m = monitor();
        let b = budget("b1", "2026-01");
        m.evaluate_spending_update(&b, 11_000_000.0, 12_500_000.0);
        assert_eq!(m.reset_budget("b1"), 1);
        assert!(m.state().alert_visible);
        m.dismiss_alert();

        let state = m.evaluate_spending_update(&b, 11_000_000.0, 12_500_000.0);
        assert!(state.alert_visible);
    }

    #[test]
    fn current_period_follows_clock() {
        let clock = Arc::new(FixedClock::at_ymd(2026, 1, 31).unwrap());
        let mut m = AlertMonitor::new(MemoryStore::new(), &AlertConfig::default())
            .with_clock(clock.clone());
        m.evaluate_for_current_period("b1", AMOUNT, 11_000_000.0, 12_500_000.0);
        m.dismiss_alert();

        clock.set(Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap());
        let state = m.evaluate_for_current_period("b1", AMOUNT, 11_000_000.0, 12_500_000.0);
        assert!(state.alert_visible);
    }

    #[test]
    fn configured_thresholds_are_evaluated_ascending() {
        let config = AlertConfig::default()
            .with_thresholds([100, 50, 80])
            .with_language(Language::En);
        let mut m = AlertMonitor::new(MemoryStore::new(), &config);
        assert_eq!(m.thresholds(), &[50, 80, 100]);

        let state = m.evaluate_spending_update(&budget("b1", "2026-01"), 0.0, 9_000_000.0);
        assert_eq!(state.active_threshold, Some(50));
        assert_eq!(state.message.as_deref(), Some("You've used 60% of this month's budget"));
    }

    #[test]
    fn state_serializes_camel_case() {
        let mut m = monitor();
        let state = m.evaluate_spending_update(&budget("b1", "2026-01"), 14_000_000.0, 15_500_000.0);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["alertVisible"], true);
        assert_eq!(json["severity"], "error");
        assert_eq!(json["activeThreshold"], 100);
    }
}
