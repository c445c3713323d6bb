use crate::engine::settings::{Baseline, SettingsError};

pub const INPUT_MIN: f64 = 0.0;
pub const INPUT_MAX: f64 = 100.0;

/// Inclusive bounds applied to raw energy values before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRange {
    min: f64,
    max: f64,
}

impl InputRange {
    /// Rejects NaN or inverted bounds, which would make clamping panic.
    pub fn new(min: f64, max: f64) -> Result<Self, SettingsError> {
        if !(min < max) {
            return Err(SettingsError::InvalidInputRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Default for InputRange {
    fn default() -> Self {
        Self {
            min: INPUT_MIN,
            max: INPUT_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    pub z: f64,
    /// Set when the sample cannot be classified (bad baseline or NaN input).
    pub degraded: bool,
}

impl Deviation {
    const DEGRADED: Self = Self {
        z: 0.0,
        degraded: true,
    };
}

/// Converts an already-clamped value into a z-score against the baseline.
pub fn normalize(value: f64, baseline: &Baseline) -> Deviation {
    if baseline.sigma <= 0.0 || !value.is_finite() {
        return Deviation::DEGRADED;
    }
    let z = (value - baseline.mu) / baseline.sigma;
    if !z.is_finite() {
        return Deviation::DEGRADED;
    }
    Deviation { z, degraded: false }
}
