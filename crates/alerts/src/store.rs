//! Alert record persistence over a [`KeyValueStore`].
//!
//! Records live under `"<namespace>:<budget_id>:<threshold>"` as JSON
//! `{"triggered": bool, "timestamp": "<RFC 3339>", "threshold": integer}`.
//! The period a budget's records belong to is kept beside them under
//! `"<namespace>:<budget_id>:period"` as a JSON string such as `"2026-01"`.
//! Budget ids are percent-escaped in keys (`%` as `%25`, `:` as `%3A`) so one
//! id can never be a key prefix of another.
//!
//! Nothing here fails outward. A missing key, malformed JSON, or a record
//! without a boolean `triggered` field reads as "never triggered"; a failed
//! write or delete is reported to the [`DiagnosticSink`] and dropped, so the
//! worst outcome is the alert firing again on the next evaluation.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use tracing::debug;

use spendwatch_core::PeriodKey;
use spendwatch_storage::KeyValueStore;

use crate::diagnostics::{DiagnosticSink, NoopSink};

/// Persisted state of one (budget, threshold) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub budget_id: String,
    pub threshold: u32,
    pub triggered: bool,
    pub fired_at: Option<DateTime<Utc>>,
}

impl AlertRecord {
    fn untriggered(budget_id: &str, threshold: u32) -> Self {
        Self {
            budget_id: budget_id.to_string(),
            threshold,
            triggered: false,
            fired_at: None,
        }
    }
}

/// On-disk value shape.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_threshold"
    )]
    threshold: Option<u32>,
}

/// Older writers stored the threshold as a float (`100.0`).
fn lenient_threshold<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|v| v.is_finite() && *v >= 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v.round() as u32))
}

const PERIOD_SUFFIX: &str = "period";

fn encode_budget_id(budget_id: &str) -> Cow<'_, str> {
    if budget_id.contains(['%', ':']) {
        Cow::Owned(budget_id.replace('%', "%25").replace(':', "%3A"))
    } else {
        Cow::Borrowed(budget_id)
    }
}

pub struct AlertStore<S> {
    store: S,
    namespace: String,
    sink: Arc<dyn DiagnosticSink>,
}

impl<S: KeyValueStore> AlertStore<S> {
    pub fn new(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            sink: Arc::new(NoopSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    fn key(&self, budget_id: &str, threshold: u32) -> String {
        format!("{}{}", self.budget_prefix(budget_id), threshold)
    }

    fn period_key(&self, budget_id: &str) -> String {
        format!("{}{}", self.budget_prefix(budget_id), PERIOD_SUFFIX)
    }

    fn budget_prefix(&self, budget_id: &str) -> String {
        format!("{}:{}:", self.namespace, encode_budget_id(budget_id))
    }

    /// Read the record for `(budget_id, threshold)`. Absent or unreadable
    /// records come back untriggered.
    pub fn get(&self, budget_id: &str, threshold: u32) -> AlertRecord {
        let key = self.key(budget_id, threshold);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return AlertRecord::untriggered(budget_id, threshold),
            Err(e) => {
                self.sink.report("get", &e, &json!({ "key": key }));
                return AlertRecord::untriggered(budget_id, threshold);
            }
        };

        let stored: StoredRecord = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                debug!(key = %key, error = %e, "Unreadable alert record treated as absent");
                self.sink.report("decode", &e, &json!({ "key": key }));
                return AlertRecord::untriggered(budget_id, threshold);
            }
        };

        let fired_at = stored.timestamp.as_deref().and_then(|ts| {
            DateTime::parse_from_rfc3339(ts)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    self.sink.report("decode", &e, &json!({ "key": key, "timestamp": ts }));
                })
                .ok()
        });

        AlertRecord {
            budget_id: budget_id.to_string(),
            threshold,
            triggered: stored.triggered,
            fired_at,
        }
    }

    /// Persist a record. Returns whether the write reached the store.
    pub fn set(
        &self,
        budget_id: &str,
        threshold: u32,
        triggered: bool,
        timestamp: Option<DateTime<Utc>>,
    ) -> bool {
        let key = self.key(budget_id, threshold);
        let stored = StoredRecord {
            triggered,
            timestamp: timestamp.map(|ts| ts.to_rfc3339()),
            threshold: Some(threshold),
        };
        let value = match serde_json::to_string(&stored) {
            Ok(value) => value,
            Err(e) => {
                self.sink.report("encode", &e, &json!({ "key": key }));
                return false;
            }
        };

        match self.store.set(&key, value) {
            Ok(()) => true,
            Err(e) => {
                self.sink.report(
                    "set",
                    &e,
                    &json!({ "key": key, "triggered": triggered }),
                );
                false
            }
        }
    }

    /// Period the stored records of `budget_id` belong to, `None` if the
    /// budget was never observed or the marker is unreadable.
    pub fn period_marker(&self, budget_id: &str) -> Option<PeriodKey> {
        let key = self.period_key(budget_id);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                self.sink.report("period_marker", &e, &json!({ "key": key }));
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| {
                debug!(key = %key, error = %e, "Unreadable period marker treated as absent");
                self.sink.report("decode", &e, &json!({ "key": key }));
            })
            .ok()
    }

    /// Record the period `budget_id`'s records belong to. Returns whether the
    /// write reached the store.
    pub fn set_period_marker(&self, budget_id: &str, period: &PeriodKey) -> bool {
        let key = self.period_key(budget_id);
        let value = match serde_json::to_string(period) {
            Ok(value) => value,
            Err(e) => {
                self.sink.report("encode", &e, &json!({ "key": key }));
                return false;
            }
        };

        match self.store.set(&key, value) {
            Ok(()) => true,
            Err(e) => {
                self.sink.report(
                    "set_period_marker",
                    &e,
                    &json!({ "key": key, "period": period.as_str() }),
                );
                false
            }
        }
    }

    /// Remove every record of `budget_id`, its period marker included,
    /// leaving other budgets untouched. Returns the number of threshold
    /// records removed.
    pub fn delete_all_for_budget(&self, budget_id: &str) -> usize {
        let prefix = self.budget_prefix(budget_id);
        let had_marker = matches!(self.store.get(&self.period_key(budget_id)), Ok(Some(_)));
        match self.store.delete_prefix(&prefix) {
            Ok(removed) => removed.saturating_sub(usize::from(had_marker)),
            Err(e) => {
                self.sink.report(
                    "delete_all_for_budget",
                    &e,
                    &json!({ "budget_id": budget_id }),
                );
                0
            }
        }
    }

    /// Every readable record of `budget_id`, ordered by threshold.
    pub fn records_for_budget(&self, budget_id: &str) -> Vec<AlertRecord> {
        let prefix = self.budget_prefix(budget_id);
        let keys = match self.store.keys_with_prefix(&prefix) {
            Ok(keys) => keys,
            Err(e) => {
                self.sink.report(
                    "records_for_budget",
                    &e,
                    &json!({ "budget_id": budget_id }),
                );
                return Vec::new();
            }
        };

        let mut records: Vec<AlertRecord> = keys
            .iter()
            .filter_map(|k| k.strip_prefix(&prefix)?.parse::<u32>().ok())
            .map(|threshold| self.get(budget_id, threshold))
            .collect();
        records.sort_by_key(|r| r.threshold);
        records
    }
}
