//! Presence detection engine.
//!
//! Turns a raw still-energy value plus a calibrated vacant baseline into a
//! debounced, hysteretic occupancy flag and a diagnostic reason string.
//! Samples flow normalizer -> classifier -> state machine; the state machine
//! owns the debounce timers and the failsafe watchdog.

pub mod classifier;
pub mod machine;
pub mod normalizer;
pub mod settings;
pub mod timer;

pub use classifier::Classification;
pub use machine::{FAILSAFE_REASON, PresenceDecision, PresenceEngine, PresenceState, Sample};
pub use normalizer::InputRange;
pub use settings::{Baseline, DebounceConfig, EngineSettings, HysteresisConfig, SettingsError};
pub use timer::Millis;
