//! Threshold gate - decides when a counted event should block.
//!
//! ## States
//!
//! ```text
//! BelowLimit --(counted event makes count >= limit)--> AtOrAboveLimit
//!      ^                                                     |
//!      +------------- reset / new day / count < limit -------+
//! ```
//!
//! Only the `BelowLimit -> AtOrAboveLimit` transition emits a
//! [`BlockTrigger`]. Further counted events while over the limit are
//! suppressed. The gate is evaluated on counted events only, so a limit
//! change by itself never triggers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{BlockReason, BlockTrigger};
use crate::ledger::DateKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    BelowLimit,
    AtOrAboveLimit,
}

impl GateState {
    fn from_count(count: u32, limit: u32) -> Self {
        if count < limit {
            GateState::BelowLimit
        } else {
            GateState::AtOrAboveLimit
        }
    }
}

/// Per-day gate state for one monitoring session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdGate {
    current: Option<(DateKey, GateState)>,
}

impl ThresholdGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for the day last observed, `None` before the first observation
    /// or after a reset.
    pub fn state(&self) -> Option<GateState> {
        self.current.as_ref().map(|(_, state)| *state)
    }

    pub fn day(&self) -> Option<&DateKey> {
        self.current.as_ref().map(|(day, _)| day)
    }

    /// Forget all state; the next observation reinitializes from its count.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Evaluate a counted event.
    ///
    /// `count` is the day's count *after* the event's increment. The state
    /// before this event is derived from `count - 1` when the day is observed
    /// for the first time, and re-derived whenever that pre-event count is
    /// below `limit` (the counter was reset or the limit raised behind the
    /// gate's back).
    pub fn observe(
        &mut self,
        app: &str,
        day: &DateKey,
        count: u32,
        limit: u32,
        at: DateTime<Utc>,
    ) -> Option<BlockTrigger> {
        let previous = count.saturating_sub(1);

        let state = match &self.current {
            Some((seen, state)) if seen == day => {
                if *state == GateState::AtOrAboveLimit && previous < limit {
                    debug!(day = %day, previous, limit, "gate re-armed below limit");
                    GateState::BelowLimit
                } else {
                    *state
                }
            }
            _ => GateState::from_count(previous, limit),
        };

        let next = match state {
            GateState::BelowLimit if count >= limit => GateState::AtOrAboveLimit,
            other => other,
        };
        self.current = Some((day.clone(), next));

        if state == GateState::BelowLimit && next == GateState::AtOrAboveLimit {
            info!(app, day = %day, count, limit, "daily limit reached");
            Some(BlockTrigger {
                app: app.to_string(),
                reason: BlockReason::DailyLimitReached,
                day: day.clone(),
                count,
                limit,
                at,
            })
        } else {
            None
        }
    }
}
