//! Presence state machine.
//!
//! Each call to [`PresenceEngine::apply_sample`] is one tick: the sample is
//! clamped, normalized and classified, the failsafe watchdog is consulted,
//! and then the transition table for the current state runs. A tick always
//! leaves the state, timers and reason fully updated.

use crate::engine::classifier::{Classification, classify};
use crate::engine::normalizer::{InputRange, normalize};
use crate::engine::settings::{
    Baseline, DebounceConfig, EngineSettings, HysteresisConfig, SettingsError,
};
use crate::engine::timer::{DebounceTimer, Millis, Watchdog};
use serde::Serialize;
use tracing::{debug, info, warn};

pub const FAILSAFE_REASON: &str = "failsafe timeout";
pub const INITIAL_REASON: &str = "initial state: vacant";
const DEGRADED_SUFFIX: &str = " [baseline degraded]";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub observed_at: Millis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceState {
    Vacant,
    CandidateOccupied,
    Occupied,
    CandidateVacant,
}

impl PresenceState {
    /// Candidates report the boolean of the state they came from.
    pub fn reports_occupied(self) -> bool {
        matches!(self, Self::Occupied | Self::CandidateVacant)
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceDecision {
    pub occupied: bool,
    pub reason: String,
    pub z: f64,
    pub classification: Classification,
    pub state: PresenceState,
    pub degraded: bool,
}

#[derive(Debug)]
pub struct PresenceEngine {
    settings: EngineSettings,
    input_range: InputRange,
    state: PresenceState,
    state_entered_at: Millis,
    reason: String,
    occupied_timer: DebounceTimer,
    vacant_timer: DebounceTimer,
    watchdog: Watchdog,
    degraded: bool,
}

impl PresenceEngine {
    pub fn new(settings: EngineSettings, input_range: InputRange) -> Self {
        Self {
            settings,
            input_range,
            state: PresenceState::Vacant,
            state_entered_at: 0,
            reason: INITIAL_REASON.to_string(),
            occupied_timer: DebounceTimer::default(),
            vacant_timer: DebounceTimer::default(),
            watchdog: Watchdog::default(),
            degraded: false,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(EngineSettings::default(), InputRange::default())
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    pub fn occupied(&self) -> bool {
        self.state.reports_occupied()
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn state_entered_at(&self) -> Millis {
        self.state_entered_at
    }

    pub fn last_reinforced_at(&self) -> Option<Millis> {
        self.watchdog.last_reinforced_at()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn occupied_timer(&self) -> &DebounceTimer {
        &self.occupied_timer
    }

    pub fn vacant_timer(&self) -> &DebounceTimer {
        &self.vacant_timer
    }

    pub fn set_baseline(&mut self, mu: f64, sigma: f64) -> Result<Baseline, SettingsError> {
        match self.settings.set_baseline(mu, sigma) {
            Ok(baseline) => {
                info!(mu, sigma, degraded = baseline.is_degraded(), "Baseline applied");
                Ok(baseline)
            }
            Err(err) => {
                warn!(mu, sigma, error = %err, "Rejected baseline update");
                Err(err)
            }
        }
    }

    pub fn set_hysteresis(
        &mut self,
        k_on: f64,
        k_off: f64,
    ) -> Result<HysteresisConfig, SettingsError> {
        match self.settings.set_hysteresis(k_on, k_off) {
            Ok(hysteresis) => {
                info!(k_on, k_off, "Hysteresis applied");
                Ok(hysteresis)
            }
            Err(err) => {
                warn!(k_on, k_off, error = %err, "Rejected hysteresis update");
                Err(err)
            }
        }
    }

    /// Running timers keep their start; only the compared duration changes.
    pub fn set_debounce(&mut self, debounce: DebounceConfig) -> DebounceConfig {
        info!(
            debounce_occupied_ms = debounce.debounce_occupied_ms,
            debounce_vacant_ms = debounce.debounce_vacant_ms,
            abs_clear_delay_ms = debounce.abs_clear_delay_ms,
            "Debounce timers applied"
        );
        self.settings.set_debounce(debounce)
    }

    pub fn reset_to_defaults(&mut self) {
        self.settings.reset_to_defaults();
        info!("Tunables reset to defaults");
    }

    pub fn apply_sample(&mut self, sample: Sample) -> PresenceDecision {
        let now = sample.observed_at;
        let value = self.input_range.clamp(sample.value);
        let deviation = normalize(value, &self.settings.baseline());
        self.track_degraded(deviation.degraded);

        let classification = classify(deviation, &self.settings.hysteresis());
        let failsafe = self.step(classification, deviation.z, now);
        if deviation.degraded && !failsafe {
            self.reason.push_str(DEGRADED_SUFFIX);
        }

        PresenceDecision {
            occupied: self.occupied(),
            reason: self.reason.clone(),
            z: deviation.z,
            classification,
            state: self.state,
            degraded: deviation.degraded,
        }
    }

    /// Runs the transition table. Returns true when the watchdog forced
    /// the transition.
    fn step(&mut self, classification: Classification, z: f64, now: Millis) -> bool {
        let debounce = self.settings.debounce();

        // The watchdog guards every state that reports occupied.
        if self.state.reports_occupied() {
            if classification == Classification::AboveOn {
                self.watchdog.reinforce(now);
            } else if self.watchdog.expired(now, debounce.abs_clear_delay_ms) {
                warn!(
                    state = ?self.state,
                    last_reinforced_at = self.watchdog.last_reinforced_at(),
                    abs_clear_delay_ms = debounce.abs_clear_delay_ms,
                    "Failsafe watchdog fired"
                );
                self.enter(PresenceState::Vacant, now, FAILSAFE_REASON.to_string());
                return true;
            }
        }

        match (self.state, classification) {
            (PresenceState::Vacant, Classification::AboveOn) => {
                self.occupied_timer.start(now);
                self.enter(
                    PresenceState::CandidateOccupied,
                    now,
                    format!("debouncing occupied: z={z:.2}"),
                );
                self.evaluate_candidate_occupied(z, now, debounce);
            }
            (PresenceState::Vacant, _) => {
                self.reason = format!("vacant: z={z:.2}");
            }
            (PresenceState::CandidateOccupied, Classification::AboveOn) => {
                self.evaluate_candidate_occupied(z, now, debounce);
            }
            (PresenceState::CandidateOccupied, _) => {
                self.enter(
                    PresenceState::Vacant,
                    now,
                    format!("occupied debounce interrupted: z={z:.2}"),
                );
            }
            (PresenceState::Occupied, Classification::AboveOn) => {
                self.reason = format!("occupied: z={z:.2}");
            }
            (PresenceState::Occupied, Classification::Between) => {
                self.reason = format!("occupied (ambiguous): z={z:.2}");
            }
            (PresenceState::Occupied, Classification::BelowOff) => {
                self.vacant_timer.start(now);
                self.enter(
                    PresenceState::CandidateVacant,
                    now,
                    format!("debouncing vacant: z={z:.2}"),
                );
                self.evaluate_candidate_vacant(z, now, debounce);
            }
            (PresenceState::CandidateVacant, Classification::BelowOff) => {
                self.evaluate_candidate_vacant(z, now, debounce);
            }
            (PresenceState::CandidateVacant, Classification::AboveOn) => {
                self.enter(PresenceState::Occupied, now, format!("occupied: z={z:.2}"));
            }
            (PresenceState::CandidateVacant, Classification::Between) => {
                self.enter(
                    PresenceState::Occupied,
                    now,
                    format!("occupied (ambiguous): z={z:.2}"),
                );
            }
        }
        false
    }

    fn evaluate_candidate_occupied(&mut self, z: f64, now: Millis, debounce: DebounceConfig) {
        let duration = debounce.debounce_occupied_ms;
        if self.occupied_timer.elapsed(now, duration) {
            self.watchdog.reinforce(now);
            self.enter(
                PresenceState::Occupied,
                now,
                format!("confirmed occupied: z={z:.2}, debounce={duration}ms"),
            );
        } else {
            self.reason = format!("debouncing occupied: z={z:.2}");
        }
    }

    fn evaluate_candidate_vacant(&mut self, z: f64, now: Millis, debounce: DebounceConfig) {
        let duration = debounce.debounce_vacant_ms;
        if self.vacant_timer.elapsed(now, duration) {
            self.enter(
                PresenceState::Vacant,
                now,
                format!("confirmed vacant: z={z:.2}, debounce={duration}ms"),
            );
        } else {
            self.reason = format!("debouncing vacant: z={z:.2}");
        }
    }

    /// Moves to `next`, keeping timers consistent with the state entered.
    fn enter(&mut self, next: PresenceState, now: Millis, reason: String) {
        match next {
            PresenceState::Vacant => {
                self.occupied_timer.cancel();
                self.vacant_timer.cancel();
                self.watchdog.disarm();
            }
            PresenceState::Occupied => {
                self.occupied_timer.cancel();
                self.vacant_timer.cancel();
            }
            PresenceState::CandidateOccupied | PresenceState::CandidateVacant => {}
        }
        if self.state != next {
            debug!(from = ?self.state, to = ?next, reason = %reason, "State transition");
            self.state = next;
            self.state_entered_at = now;
        }
        self.reason = reason;
    }

    fn track_degraded(&mut self, degraded: bool) {
        if degraded && !self.degraded {
            warn!(
                sigma = self.settings.baseline().sigma,
                "Samples unclassifiable, holding current state until recalibrated"
            );
        } else if !degraded && self.degraded {
            info!("Samples classifiable again");
        }
        self.degraded = degraded;
    }
}

impl Default for PresenceEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}
