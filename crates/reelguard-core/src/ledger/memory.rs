//! In-process ledger for tests and dry-run replays.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::{validate_limit, DateKey, UsageLedger, DEFAULT_LIMIT};
use crate::error::LedgerError;

/// Ledger held entirely in memory. Nothing survives the process.
#[derive(Debug)]
pub struct MemoryLedger {
    counts: Mutex<HashMap<DateKey, u32>>,
    limit: AtomicU32,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            limit: AtomicU32::new(DEFAULT_LIMIT),
        }
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger starting at `limit` (validated).
    pub fn with_limit(limit: u32) -> Result<Self, LedgerError> {
        let ledger = Self::default();
        ledger.set_limit(limit)?;
        Ok(ledger)
    }

    /// Seed a day's count directly, e.g. to resume from recorded history.
    pub fn set_count(&self, day: &DateKey, count: u32) -> Result<(), LedgerError> {
        let mut counts = self.counts.lock().map_err(|_| LedgerError::Poisoned)?;
        counts.insert(day.clone(), count);
        Ok(())
    }
}

impl UsageLedger for MemoryLedger {
    fn count(&self, day: &DateKey) -> Result<u32, LedgerError> {
        let counts = self.counts.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(counts.get(day).copied().unwrap_or(0))
    }

    fn increment(&self, day: &DateKey) -> Result<u32, LedgerError> {
        let mut counts = self.counts.lock().map_err(|_| LedgerError::Poisoned)?;
        let count = counts.entry(day.clone()).or_insert(0);
        *count = count.saturating_add(1);
        Ok(*count)
    }

    fn limit(&self) -> Result<u32, LedgerError> {
        Ok(self.limit.load(Ordering::Acquire))
    }

    fn set_limit(&self, limit: u32) -> Result<u32, LedgerError> {
        let limit = validate_limit(limit)?;
        self.limit.store(limit, Ordering::Release);
        Ok(limit)
    }

    fn reset(&self, day: &DateKey) -> Result<(), LedgerError> {
        let mut counts = self.counts.lock().map_err(|_| LedgerError::Poisoned)?;
        counts.insert(day.clone(), 0);
        Ok(())
    }
}
