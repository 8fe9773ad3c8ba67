//! End-to-end alert scenarios over the real store backends.

use std::sync::{Arc, Mutex};

use spendwatch_alerts::{evaluate, format_message, AlertMonitor, DiagnosticSink, Severity};
use spendwatch_core::{AlertConfig, Budget, FixedClock};
use spendwatch_storage::{FileStore, KeyValueStore, MemoryStore};
use tempfile::TempDir;

const AMOUNT: f64 = 15_000_000.0;

#[derive(Default)]
struct CountingSink {
    operations: Mutex<Vec<String>>,
}

impl DiagnosticSink for CountingSink {
    fn report(&self, operation: &str, _error: &dyn std::error::Error, _context: &serde_json::Value) {
        self.operations.lock().unwrap().push(operation.to_string());
    }
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at_ymd(2026, 1, 10).unwrap())
}

// ── Evaluator and formatter ─────────────────────────────────────

#[test]
fn crossing_eighty_percent() {
    assert!(evaluate(11_000_000.0, 12_500_000.0, AMOUNT, 80.0, false));
}

#[test]
fn already_above_eighty_percent() {
    assert!(!evaluate(13_000_000.0, 14_000_000.0, AMOUNT, 80.0, false));
}

#[test]
fn over_budget_message_contains_excess() {
    assert!(format_message(15_500_000.0, AMOUNT, 100, "vi").contains("500,000đ"));
}

#[test]
fn warning_message_contains_percent_and_amounts() {
    let msg = format_message(12_000_000.0, AMOUNT, 80, "vi");
    for needle in ["80%", "12M", "15M"] {
        assert!(msg.contains(needle), "{msg} should contain {needle}");
    }
}

#[test]
fn nan_new_total_does_not_fire() {
    assert!(!evaluate(10_000_000.0, f64::NAN, AMOUNT, 80.0, false));
}

// ── Monitor ─────────────────────────────────────────────────────

#[test]
fn period_change_fires_again() {
    let mut monitor = AlertMonitor::new(MemoryStore::new(), &AlertConfig::default()).with_clock(clock());

    let january = Budget::new("b1", AMOUNT, "2026-01");
    assert!(monitor.evaluate_spending_update(&january, 11_000_000.0, 12_500_000.0).alert_visible);
    monitor.dismiss_alert();
    assert!(!monitor.evaluate_spending_update(&january, 11_000_000.0, 12_500_000.0).alert_visible);

    let february = Budget::new("b1", AMOUNT, "2026-02");
    let state = monitor.evaluate_spending_update(&february, 11_000_000.0, 12_500_000.0);
    assert!(state.alert_visible);
    assert_eq!(state.active_threshold, Some(80));
}

#[test]
fn records_survive_restart_with_file_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("alerts.json");
    let budget = Budget::new("b1", AMOUNT, "2026-01");

    {
        let store = FileStore::open(&path).unwrap();
        let mut monitor = AlertMonitor::new(store, &AlertConfig::default()).with_clock(clock());
        let state = monitor.evaluate_spending_update(&budget, 1_000_000.0, 16_000_000.0);
        assert_eq!(state.severity, Some(Severity::Error));
    }

    let store = FileStore::open(&path).unwrap();
    let raw = store.get("budget_alert:b1:100").unwrap().expect("record persisted");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["triggered"], true);
    assert_eq!(value["timestamp"], "2026-01-10T00:00:00+00:00");

    let mut monitor = AlertMonitor::new(store, &AlertConfig::default()).with_clock(clock());
    let state = monitor.evaluate_spending_update(&budget, 1_000_000.0, 16_000_000.0);
    assert!(!state.alert_visible);
    assert_eq!(monitor.records_for_budget("b1").len(), 2);
}

#[test]
fn month_rollover_across_restart_with_file_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("alerts.json");

    {
        let store = FileStore::open(&path).unwrap();
        let mut monitor = AlertMonitor::new(store, &AlertConfig::default()).with_clock(clock());
        let january = Budget::new("b1", AMOUNT, "2026-01");
        assert!(monitor.evaluate_spending_update(&january, 11_000_000.0, 12_500_000.0).alert_visible);
    }

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get("budget_alert:b1:period").unwrap().as_deref(), Some("\"2026-01\""));

    let mut monitor = AlertMonitor::new(store, &AlertConfig::default()).with_clock(clock());
    let february = Budget::new("b1", AMOUNT, "2026-02");
    let state = monitor.evaluate_spending_update(&february, 11_000_000.0, 12_500_000.0);
    assert!(state.alert_visible);
    assert_eq!(state.active_threshold, Some(80));
    drop(monitor);

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get("budget_alert:b1:period").unwrap().as_deref(), Some("\"2026-02\""));
    let mut monitor = AlertMonitor::new(store, &AlertConfig::default()).with_clock(clock());
    assert!(!monitor.evaluate_spending_update(&february, 11_000_000.0, 12_500_000.0).alert_visible);
}

#[test]
fn full_store_degrades_to_refire() {
    // Room for nothing: every trigger write fails.
    let sink = Arc::new(CountingSink::default());
    let mut monitor = AlertMonitor::new(MemoryStore::with_capacity_bytes(0), &AlertConfig::default())
        .with_clock(clock())
        .with_sink(sink.clone());
    let budget = Budget::new("b1", AMOUNT, "2026-01");

    let first = monitor.evaluate_spending_update(&budget, 11_000_000.0, 12_500_000.0);
    assert!(first.alert_visible);
    assert!(!monitor.fired_in_last_update()[0].persisted);

    monitor.dismiss_alert();
    let second = monitor.evaluate_spending_update(&budget, 11_000_000.0, 12_500_000.0);
    assert!(second.alert_visible);

    assert_eq!(
        *sink.operations.lock().unwrap(),
        vec!["set_period_marker", "set", "set_period_marker", "set"]
    );
}

#[test]
fn corrupted_record_reads_as_untriggered() {
    let store = Arc::new(MemoryStore::new());
    store.set("budget_alert:b1:80", "{\"triggered\":".to_string()).unwrap();

    let mut monitor = AlertMonitor::new(store.clone(), &AlertConfig::default()).with_clock(clock());
    let state = monitor.evaluate_spending_update(&Budget::new("b1", AMOUNT, "2026-01"), 11_000_000.0, 12_500_000.0);
    assert!(state.alert_visible);

    // The broken record was overwritten by a valid one.
    let raw = store.get("budget_alert:b1:80").unwrap().unwrap();
    assert!(raw.contains("\"triggered\":true"));
}

#[test]
fn custom_namespace_scopes_keys() {
    let store = Arc::new(MemoryStore::new());
    let config = AlertConfig::default().with_namespace("household");
    let mut monitor = AlertMonitor::new(store.clone(), &config).with_clock(clock());
    monitor.evaluate_spending_update(&Budget::new("b1", AMOUNT, "2026-01"), 0.0, 12_000_000.0);

    assert_eq!(
        store.keys_with_prefix("").unwrap(),
        vec!["household:b1:80".to_string(), "household:b1:period".to_string()]
    );
}
