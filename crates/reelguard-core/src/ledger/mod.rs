//! Usage ledger: the per-day counter and the global daily limit.
//!
//! The engine is the single writer. Readers (the status reporter, the CLI)
//! may run concurrently; every method takes `&self` and implementations
//! make each update atomic and visible as soon as the call returns.
//!
//! ## Key layout
//!
//! - `usage_count_<YYYY-MM-DD>`: counted events for that local date
//! - `reel_limit`: the daily limit, default 50, bounds [10, 10000]

mod memory;

pub use memory::MemoryLedger;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::LedgerError;

pub const USAGE_KEY_PREFIX: &str = "usage_count_";
pub const LIMIT_KEY: &str = "reel_limit";

pub const DEFAULT_LIMIT: u32 = 50;
pub const MIN_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 10_000;

/// Quick-pick limits offered by the settings screen.
pub const LIMIT_PRESETS: [u32; 6] = [25, 50, 100, 200, 500, 1000];

/// Calendar day a usage count belongs to, formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        DateKey(date.format("%Y-%m-%d").to_string())
    }

    /// Local calendar date of `at`.
    pub fn for_instant<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self::from_date(at.with_timezone(&Local).date_naive())
    }

    pub fn today() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    /// Parse a `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(Self::from_date)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which this day's count is persisted.
    pub fn storage_key(&self) -> String {
        format!("{USAGE_KEY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check a limit coming from the settings side.
pub fn validate_limit(limit: u32) -> Result<u32, LedgerError> {
    if (MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(LedgerError::InvalidLimit(limit))
    }
}

/// Bring a stored limit back into range.
pub fn clamp_limit(limit: i64) -> u32 {
    limit.clamp(MIN_LIMIT as i64, MAX_LIMIT as i64) as u32
}

/// Persistence interface for usage counts and the daily limit.
pub trait UsageLedger: Send + Sync {
    /// Count for `day`, 0 if nothing was recorded.
    fn count(&self, day: &DateKey) -> Result<u32, LedgerError>;

    /// Atomically add one to `day`'s count, creating it if absent.
    /// Returns the new count.
    fn increment(&self, day: &DateKey) -> Result<u32, LedgerError>;

    /// Current daily limit, [`DEFAULT_LIMIT`] if never set.
    fn limit(&self) -> Result<u32, LedgerError>;

    /// Store a new limit. Rejects values outside [[`MIN_LIMIT`], [`MAX_LIMIT`]].
    fn set_limit(&self, limit: u32) -> Result<u32, LedgerError>;

    /// Set `day`'s count back to 0.
    fn reset(&self, day: &DateKey) -> Result<(), LedgerError>;
}

impl<T: UsageLedger + ?Sized> UsageLedger for Arc<T> {
    fn count(&self, day: &DateKey) -> Result<u32, LedgerError> {
        (**self).count(day)
    }

    fn increment(&self, day: &DateKey) -> Result<u32, LedgerError> {
        (**self).increment(day)
    }

    fn limit(&self) -> Result<u32, LedgerError> {
        (**self).limit()
    }

    fn set_limit(&self, limit: u32) -> Result<u32, LedgerError> {
        (**self).set_limit(limit)
    }

    fn reset(&self, day: &DateKey) -> Result<(), LedgerError> {
        (**self).reset(day)
    }
}

/// Point-in-time view of today's usage, as shown in a status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatus {
    pub day: DateKey,
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub limit_reached: bool,
}

impl UsageStatus {
    pub fn new(day: DateKey, count: u32, limit: u32) -> Self {
        Self {
            day,
            count,
            limit,
            remaining: limit.saturating_sub(count),
            limit_reached: count >= limit,
        }
    }

    /// Read `day`'s status from a ledger.
    pub fn read<L: UsageLedger + ?Sized>(ledger: &L, day: DateKey) -> Result<Self, LedgerError> {
        let count = ledger.count(&day)?;
        let limit = ledger.limit()?;
        Ok(Self::new(day, count, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn storage_key_layout() {
        let day = DateKey::from_date(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
        assert_eq!(day.as_str(), "2026-03-07");
        assert_eq!(day.storage_key(), "usage_count_2026-03-07");
    }

    #[test]
    fn for_instant_uses_local_date() {
        let at = Utc::now();
        assert_eq!(
            DateKey::for_instant(&at),
            DateKey::from_date(at.with_timezone(&Local).date_naive())
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(DateKey::parse("2026-02-30").is_none());
        assert!(DateKey::parse("yesterday").is_none());
        assert_eq!(DateKey::parse("2026-10-15").unwrap().as_str(), "2026-10-15");
    }

    #[test]
    fn limit_bounds() {
        assert!(validate_limit(9).is_err());
        assert_eq!(validate_limit(10).unwrap(), 10);
        assert_eq!(validate_limit(10_000).unwrap(), 10_000);
        assert!(matches!(
            validate_limit(10_001),
            Err(LedgerError::InvalidLimit(10_001))
        ));
        assert!(LIMIT_PRESETS.iter().all(|p| validate_limit(*p).is_ok()));
    }

    #[test]
    fn clamp_stored_limit() {
        assert_eq!(clamp_limit(-4), MIN_LIMIT);
        assert_eq!(clamp_limit(75), 75);
        assert_eq!(clamp_limit(1_000_000), MAX_LIMIT);
    }

    #[test]
    fn usage_status_math() {
        let day = DateKey::parse("2026-10-15").unwrap();
        let under = UsageStatus::new(day.clone(), 12, 50);
        assert_eq!(under.remaining, 38);
        assert!(!under.limit_reached);

        let over = UsageStatus::new(day, 51, 50);
        assert_eq!(over.remaining, 0);
        assert!(over.limit_reached);
    }
}
