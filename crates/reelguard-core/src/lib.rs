//! # ReelGuard Core Library
//!
//! Core logic for ReelGuard, a limiter for short-form video feeds. It
//! watches scroll events from the foreground app, decides whether the user
//! is inside a short-form feed, counts debounced scrolls per calendar day,
//! and emits a single block signal when the daily limit is crossed.
//!
//! The CLI binary drives the same library; OS accessibility hooks and the
//! blocking surface itself live outside this crate.
//!
//! ## Architecture
//!
//! - **Classifier**: bounded depth-first keyword scan over a UI snapshot
//! - **Engine**: debouncer, threshold gate and the controller tying them to
//!   the ledger
//! - **Ledger**: per-day counters and the global limit, in memory or SQLite
//! - **Storage**: SQLite ledger and TOML configuration
//! - **Reporter**: background task publishing today's usage
//!
//! ## Key Components
//!
//! - [`UiSnapshotClassifier`]: short-form feed detection
//! - [`EnforcementController`]: per-event pipeline
//! - [`UsageLedger`]: persistence interface
//! - [`Config`]: application configuration management

pub mod classifier;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod reporter;
pub mod snapshot;
pub mod storage;

pub use classifier::{
    AppProfile, Classification, FeedHeuristic, MonitoredApps, TraversalLimits,
    UiSnapshotClassifier,
};
pub use engine::{
    DebounceDecision, DebounceState, EnforcementController, EventOutcome, GateState,
    SessionContext, ThresholdGate,
};
pub use error::{ConfigError, CoreError, EngineError, LedgerError, SnapshotError};
pub use events::{BlockAction, BlockReason, BlockTrigger, EventKind, ScrollEvent};
pub use ledger::{DateKey, MemoryLedger, UsageLedger, UsageStatus};
pub use reporter::StatusReporter;
pub use snapshot::{NoSnapshot, NodeId, SnapshotNode, SnapshotProvider, UiNode, UiSnapshot};
pub use storage::{Config, SqliteLedger};
