//! Scroll event debouncing.
//!
//! Event sources fire several scroll callbacks per swipe. Counting at most
//! one scroll per `min_interval` collapses a gesture into one unit without
//! needing gesture start/end events.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::EventKind;

/// Default minimum gap between two counted scrolls.
pub const DEFAULT_MIN_INTERVAL_MS: i64 = 1000;

/// Debounce state for one controller (one foreground app context).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceState {
    /// Timestamp of the last counted scroll.
    pub last_counted: Option<DateTime<Utc>>,
    /// A scroll counts only if strictly more than this after `last_counted`.
    pub min_interval: Duration,
}

impl Default for DebounceState {
    fn default() -> Self {
        Self::with_interval(Duration::milliseconds(DEFAULT_MIN_INTERVAL_MS))
    }
}

impl DebounceState {
    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            last_counted: None,
            min_interval,
        }
    }
}

/// Why a scroll was or was not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebounceDecision {
    Counted,
    NotInFeed,
    NotAScroll,
    /// Within `min_interval` of the last counted scroll.
    Suppressed,
    /// Timestamp earlier than the last counted scroll.
    ClockAnomaly,
}

impl DebounceDecision {
    pub fn counts(self) -> bool {
        matches!(self, DebounceDecision::Counted)
    }
}

/// Decide whether an event counts toward usage.
///
/// Returns the decision and the state to carry into the next call. The
/// state only changes when the event is counted.
pub fn should_count(
    verdict: bool,
    kind: EventKind,
    at: DateTime<Utc>,
    state: DebounceState,
) -> (bool, DebounceState) {
    let (decision, next) = decide(verdict, kind, at, state);
    (decision.counts(), next)
}

/// [`should_count`] with the reason attached.
pub fn decide(
    verdict: bool,
    kind: EventKind,
    at: DateTime<Utc>,
    state: DebounceState,
) -> (DebounceDecision, DebounceState) {
    if !verdict {
        return (DebounceDecision::NotInFeed, state);
    }
    if kind != EventKind::Scrolled {
        return (DebounceDecision::NotAScroll, state);
    }

    let decision = match state.last_counted {
        None => DebounceDecision::Counted,
        Some(last) if at < last => DebounceDecision::ClockAnomaly,
        Some(last) if at - last > state.min_interval => DebounceDecision::Counted,
        Some(_) => DebounceDecision::Suppressed,
    };

    if decision.counts() {
        (
            decision,
            DebounceState {
                last_counted: Some(at),
                ..state
            },
        )
    } else {
        (decision, state)
    }
}
