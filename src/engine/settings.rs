//! Calibrated baseline and tunables consumed by every tick.
//!
//! All three groups are replaced atomically through validating setters on
//! [`EngineSettings`]. A rejected update leaves the previous values in place.

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_MU: f64 = 6.7;
pub const DEFAULT_SIGMA: f64 = 3.5;
pub const DEFAULT_K_ON: f64 = 4.0;
pub const DEFAULT_K_OFF: f64 = 2.0;
pub const DEFAULT_DEBOUNCE_OCCUPIED_MS: u64 = 3000;
pub const DEFAULT_DEBOUNCE_VACANT_MS: u64 = 5000;
pub const DEFAULT_ABS_CLEAR_DELAY_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("k_on ({k_on}) must be greater than k_off ({k_off})")]
    InvertedHysteresis { k_on: f64, k_off: f64 },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("input range min ({min}) must be below max ({max})")]
    InvalidInputRange { min: f64, max: f64 },
    #[error("{field} must not be negative (got {value})")]
    NegativeDuration { field: &'static str, value: i64 },
}

/// Mean and spread of the still-energy signal over a known-vacant period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baseline {
    pub mu: f64,
    pub sigma: f64,
}

impl Baseline {
    pub fn new(mu: f64, sigma: f64) -> Result<Self, SettingsError> {
        if !mu.is_finite() {
            return Err(SettingsError::NonFinite { field: "mu" });
        }
        if !sigma.is_finite() {
            return Err(SettingsError::NonFinite { field: "sigma" });
        }
        Ok(Self { mu, sigma })
    }

    /// A zero or negative spread marks an uncalibrated or corrupt baseline.
    pub fn is_degraded(&self) -> bool {
        self.sigma <= 0.0
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            mu: DEFAULT_MU,
            sigma: DEFAULT_SIGMA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HysteresisConfig {
    pub k_on: f64,
    pub k_off: f64,
}

impl HysteresisConfig {
    pub fn new(k_on: f64, k_off: f64) -> Result<Self, SettingsError> {
        if !k_on.is_finite() {
            return Err(SettingsError::NonFinite { field: "k_on" });
        }
        if !k_off.is_finite() {
            return Err(SettingsError::NonFinite { field: "k_off" });
        }
        if k_on <= k_off {
            return Err(SettingsError::InvertedHysteresis { k_on, k_off });
        }
        Ok(Self { k_on, k_off })
    }
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            k_on: DEFAULT_K_ON,
            k_off: DEFAULT_K_OFF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DebounceConfig {
    pub debounce_occupied_ms: u64,
    pub debounce_vacant_ms: u64,
    pub abs_clear_delay_ms: u64,
}

impl DebounceConfig {
    /// Builds a config from signed inputs as they arrive from an external layer.
    pub fn from_signed(
        debounce_occupied_ms: i64,
        debounce_vacant_ms: i64,
        abs_clear_delay_ms: i64,
    ) -> Result<Self, SettingsError> {
        Ok(Self {
            debounce_occupied_ms: non_negative("debounce_occupied_ms", debounce_occupied_ms)?,
            debounce_vacant_ms: non_negative("debounce_vacant_ms", debounce_vacant_ms)?,
            abs_clear_delay_ms: non_negative("abs_clear_delay_ms", abs_clear_delay_ms)?,
        })
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, SettingsError> {
    u64::try_from(value).map_err(|_| SettingsError::NegativeDuration { field, value })
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            debounce_occupied_ms: DEFAULT_DEBOUNCE_OCCUPIED_MS,
            debounce_vacant_ms: DEFAULT_DEBOUNCE_VACANT_MS,
            abs_clear_delay_ms: DEFAULT_ABS_CLEAR_DELAY_MS,
        }
    }
}

/// One consistent snapshot of everything a tick compares against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineSettings {
    baseline: Baseline,
    hysteresis: HysteresisConfig,
    debounce: DebounceConfig,
}

impl EngineSettings {
    pub fn new(
        baseline: Baseline,
        hysteresis: HysteresisConfig,
        debounce: DebounceConfig,
    ) -> Result<Self, SettingsError> {
        // Public fields can bypass the checked constructors.
        let baseline = Baseline::new(baseline.mu, baseline.sigma)?;
        let hysteresis = HysteresisConfig::new(hysteresis.k_on, hysteresis.k_off)?;
        Ok(Self {
            baseline,
            hysteresis,
            debounce,
        })
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    pub fn hysteresis(&self) -> HysteresisConfig {
        self.hysteresis
    }

    pub fn debounce(&self) -> DebounceConfig {
        self.debounce
    }

    pub fn set_baseline(&mut self, mu: f64, sigma: f64) -> Result<Baseline, SettingsError> {
        self.baseline = Baseline::new(mu, sigma)?;
        Ok(self.baseline)
    }

    pub fn set_hysteresis(
        &mut self,
        k_on: f64,
        k_off: f64,
    ) -> Result<HysteresisConfig, SettingsError> {
        self.hysteresis = HysteresisConfig::new(k_on, k_off)?;
        Ok(self.hysteresis)
    }

    pub fn set_debounce(&mut self, debounce: DebounceConfig) -> DebounceConfig {
        self.debounce = debounce;
        self.debounce
    }

    /// Restores multipliers and durations. The baseline is a calibration
    /// output and is kept.
    pub fn reset_to_defaults(&mut self) {
        self.hysteresis = HysteresisConfig::default();
        self.debounce = DebounceConfig::default();
    }

    pub fn on_threshold(&self) -> f64 {
        self.baseline.mu + self.hysteresis.k_on * self.baseline.sigma
    }

    pub fn off_threshold(&self) -> f64 {
        self.baseline.mu + self.hysteresis.k_off * self.baseline.sigma
    }
}
