//! Enforcement controller.
//!
//! Runs one accessibility event through the whole pipeline:
//!
//! ```text
//! monitored? -> snapshot -> classify -> debounce -> ledger.increment -> gate
//! ```
//!
//! Events are processed one at a time by a single owner (`&mut self`), so
//! nothing in here needs a lock. The ledger may still be shared with
//! concurrent readers.
//!
//! ## Failure handling
//!
//! - snapshot unavailable: not in feed, nothing counted (always-in-feed apps
//!   never ask for one)
//! - ledger increment fails: [`EngineError::LedgerWrite`]; the debounce state
//!   is left untouched so the next scroll tries again
//! - ledger read (limit) fails: the event stays counted, no block
//!
//! ## Usage
//!
//! ```ignore
//! let mut controller = EnforcementController::new(classifier, ledger);
//! for event in source {
//!     controller.handle_event(&event, &provider, &block_action);
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::debounce::{self, DebounceDecision, DebounceState};
use super::gate::ThresholdGate;
use crate::classifier::UiSnapshotClassifier;
use crate::error::{EngineError, LedgerError};
use crate::events::{BlockAction, BlockTrigger, ScrollEvent};
use crate::ledger::{DateKey, UsageLedger};
use crate::snapshot::{SnapshotProvider, UiSnapshot};
use crate::storage::Config;

/// The monitored app currently in the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub app: String,
    pub started_at: DateTime<Utc>,
    /// Classifier verdict for the most recent event.
    pub in_feed: bool,
    /// Events counted during this session.
    pub counted: u32,
}

/// Result of processing one event, for callers that want more than the
/// trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    pub monitored: bool,
    pub in_feed: bool,
    pub decision: Option<DebounceDecision>,
    /// Day count after this event, when it was counted.
    pub count: Option<u32>,
    pub trigger: Option<BlockTrigger>,
}

impl EventOutcome {
    fn unmonitored() -> Self {
        Self {
            monitored: false,
            in_feed: false,
            decision: None,
            count: None,
            trigger: None,
        }
    }
}

/// Orchestrates classifier, debouncer, ledger and gate for a single event
/// stream.
pub struct EnforcementController<L: UsageLedger> {
    classifier: UiSnapshotClassifier,
    ledger: L,
    debounce: DebounceState,
    gate: ThresholdGate,
    session: Option<SessionContext>,
}

impl<L: UsageLedger> EnforcementController<L> {
    pub fn new(classifier: UiSnapshotClassifier, ledger: L) -> Self {
        Self::with_debounce(classifier, ledger, DebounceState::default())
    }

    /// Controller using the configured apps, traversal limits and debounce
    /// window.
    pub fn from_config(config: &Config, ledger: L) -> Self {
        Self::with_debounce(
            config.classifier(),
            ledger,
            DebounceState::with_interval(config.debounce_interval()),
        )
    }

    pub fn with_debounce(
        classifier: UiSnapshotClassifier,
        ledger: L,
        debounce: DebounceState,
    ) -> Self {
        Self {
            classifier,
            ledger,
            debounce,
            gate: ThresholdGate::new(),
            session: None,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn classifier(&self) -> &UiSnapshotClassifier {
        &self.classifier
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn debounce_state(&self) -> DebounceState {
        self.debounce
    }

    pub fn gate(&self) -> &ThresholdGate {
        &self.gate
    }

    /// Process one event. Returns a trigger when this event crossed the
    /// daily limit.
    ///
    /// # Errors
    /// Only a failed ledger increment is reported; the event stream can
    /// continue with the next event.
    pub fn on_event<P>(
        &mut self,
        event: &ScrollEvent,
        provider: &P,
    ) -> Result<Option<BlockTrigger>, EngineError>
    where
        P: SnapshotProvider + ?Sized,
    {
        self.process(event, provider).map(|outcome| outcome.trigger)
    }

    /// Same as [`on_event`](Self::on_event), reporting every step.
    ///
    /// # Errors
    /// See [`on_event`](Self::on_event).
    pub fn process<P>(
        &mut self,
        event: &ScrollEvent,
        provider: &P,
    ) -> Result<EventOutcome, EngineError>
    where
        P: SnapshotProvider + ?Sized,
    {
        if !self.classifier.is_monitored(&event.app) {
            if let Some(session) = self.session.take() {
                info!(app = %session.app, counted = session.counted, "left monitored app");
            }
            return Ok(EventOutcome::unmonitored());
        }

        let in_feed = self.classify(event, provider);
        self.track_session(event, in_feed);

        let (decision, next) = debounce::decide(in_feed, event.kind, event.at, self.debounce);
        if !decision.counts() {
            if decision == DebounceDecision::ClockAnomaly {
                debug!(app = %event.app, at = %event.at, "scroll timestamp went backwards");
            }
            return Ok(EventOutcome {
                monitored: true,
                in_feed,
                decision: Some(decision),
                count: None,
                trigger: None,
            });
        }

        let day = DateKey::for_instant(&event.at);
        let count = self.ledger.increment(&day).map_err(EngineError::LedgerWrite)?;
        self.debounce = next;
        if let Some(session) = self.session.as_mut() {
            session.counted += 1;
        }
        debug!(app = %event.app, day = %day, count, "scroll counted");

        let trigger = match self.ledger.limit() {
            Ok(limit) => self.gate.observe(&event.app, &day, count, limit, event.at),
            Err(e) => {
                warn!("limit unavailable, not blocking: {e}");
                None
            }
        };

        Ok(EventOutcome {
            monitored: true,
            in_feed,
            decision: Some(decision),
            count: Some(count),
            trigger,
        })
    }

    /// Run [`on_event`](Self::on_event) and hand any trigger to `action`.
    ///
    /// Ledger and block action failures are logged and swallowed so the
    /// event stream keeps flowing. Returns the trigger, if one fired.
    pub fn handle_event<P, A>(
        &mut self,
        event: &ScrollEvent,
        provider: &P,
        action: &A,
    ) -> Option<BlockTrigger>
    where
        P: SnapshotProvider + ?Sized,
        A: BlockAction + ?Sized,
    {
        match self.on_event(event, provider) {
            Ok(Some(trigger)) => {
                if let Err(e) = action.present(&trigger) {
                    warn!(app = %trigger.app, "failed to present block: {e}");
                }
                Some(trigger)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(app = %event.app, "{e}");
                None
            }
        }
    }

    /// Manual reset of `now`'s day: zero the counter and re-arm the gate.
    ///
    /// # Errors
    /// Returns the ledger error if the reset could not be stored.
    pub fn reset_today(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        let day = DateKey::for_instant(&now);
        self.ledger.reset(&day)?;
        self.gate.reset();
        info!(day = %day, "usage reset");
        Ok(())
    }

    fn classify<P>(&self, event: &ScrollEvent, provider: &P) -> bool
    where
        P: SnapshotProvider + ?Sized,
    {
        if !self.classifier.requires_snapshot(&event.app) {
            return self.classifier.classify(&event.app, &UiSnapshot::new());
        }

        match provider.snapshot() {
            Ok(snapshot) => {
                let result = self.classifier.inspect(&event.app, &snapshot);
                if let Some(hit) = &result.matched {
                    debug!(
                        app = %event.app,
                        keyword = %hit.keyword,
                        field = ?hit.field,
                        "short-form feed detected"
                    );
                }
                result.in_feed
            }
            Err(e) => {
                warn!(app = %event.app, "no snapshot, treating as outside feed: {e}");
                false
            }
        }
    }

    fn track_session(&mut self, event: &ScrollEvent, in_feed: bool) {
        match self.session.as_mut() {
            Some(session) if session.app == event.app => session.in_feed = in_feed,
            _ => {
                info!(app = %event.app, "monitored app in foreground");
                self.session = Some(SessionContext {
                    app: event.app.clone(),
                    started_at: event.at,
                    in_feed,
                    counted: 0,
                });
            }
        }
    }
}
