use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::DateKey;

/// Kind of accessibility event. Only scrolls can be counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Scrolled,
    #[serde(other)]
    Other,
}

/// One event from the accessibility source, consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollEvent {
    /// Foreground application identifier.
    pub app: String,
    pub at: DateTime<Utc>,
    pub kind: EventKind,
}

impl ScrollEvent {
    pub fn new(app: impl Into<String>, at: DateTime<Utc>, kind: EventKind) -> Self {
        Self {
            app: app.into(),
            at,
            kind,
        }
    }

    pub fn scrolled(app: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(app, at, EventKind::Scrolled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    DailyLimitReached,
}

/// Signal to show the blocking surface. Emitted once per limit crossing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTrigger {
    pub app: String,
    pub reason: BlockReason,
    pub day: DateKey,
    /// Count after the event that crossed the limit.
    pub count: u32,
    pub limit: u32,
    pub at: DateTime<Utc>,
}

/// The external "present blocking surface" collaborator.
pub trait BlockAction {
    /// Show the block for `trigger`. Invoked at most once per gate transition.
    fn present(&self, trigger: &BlockTrigger) -> crate::error::Result<()>;
}

impl<F> BlockAction for F
where
    F: Fn(&BlockTrigger) -> crate::error::Result<()>,
{
    fn present(&self, trigger: &BlockTrigger) -> crate::error::Result<()> {
        self(trigger)
    }
}
