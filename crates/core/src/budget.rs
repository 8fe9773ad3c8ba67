//! Budget and accounting-period types.
//!
//! A [`Budget`] is owned by the caller and treated as immutable for the
//! duration of one evaluation. Its [`PeriodKey`] scopes every alert record:
//! when the key changes, the previous period's records are discarded.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{CoreError, Result};

/// Identifier of an accounting period, conventionally `"YYYY-MM"`.
///
/// Any string is accepted through [`From`] so callers with their own period
/// naming keep working; [`PeriodKey::parse`] enforces the monthly form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    /// Parse a strict `YYYY-MM` key.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidPeriodKey(raw.to_string());
        let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(Self(raw.to_string()))
    }

    /// Monthly key for the month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeriodKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PeriodKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A monthly spending budget as observed by the alert core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Opaque budget identity.
    pub id: String,
    /// Budget limit in currency units. Non-positive means "not configured".
    pub amount: f64,
    /// Accounting period this budget applies to.
    pub period_key: PeriodKey,
}

impl Budget {
    pub fn new(id: impl Into<String>, amount: f64, period_key: impl Into<PeriodKey>) -> Self {
        Self {
            id: id.into(),
            amount,
            period_key: period_key.into(),
        }
    }

    /// Build a budget scoped to the period the clock currently reports.
    pub fn for_current_period(id: impl Into<String>, amount: f64, clock: &dyn Clock) -> Self {
        Self::new(id, amount, clock.current_period())
    }

    /// Whether the budget can be used for percentage arithmetic.
    pub fn is_configured(&self) -> bool {
        self.amount > 0.0
    }
}
