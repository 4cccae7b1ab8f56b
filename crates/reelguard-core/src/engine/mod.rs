mod controller;
pub mod debounce;
mod gate;

pub use controller::{EnforcementController, EventOutcome, SessionContext};
pub use debounce::{should_count, DebounceDecision, DebounceState, DEFAULT_MIN_INTERVAL_MS};
pub use gate::{GateState, ThresholdGate};
