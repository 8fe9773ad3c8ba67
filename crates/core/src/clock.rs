//! Injectable time source.
//!
//! Alert timestamps and the "current period" both come from a [`Clock`] so
//! evaluation and rollover are deterministic under test.

use std::sync::RwLock;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::budget::PeriodKey;

pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Period containing the current instant.
    fn current_period(&self) -> PeriodKey {
        PeriodKey::from_date(self.now().date_naive())
    }
}

/// Wall-clock time. Periods follow the host's local calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn current_period(&self) -> PeriodKey {
        PeriodKey::from_date(Local::now().date_naive())
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    /// Midnight UTC on the given date, `None` for an impossible date.
    pub fn at_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
        Some(Self::new(Utc.from_utc_datetime(&midnight)))
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        // A panicked writer cannot leave a half-written instant behind.
        *self.instant.write().unwrap_or_else(|e| e.into_inner()) = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read().unwrap_or_else(|e| e.into_inner())
    }
}
