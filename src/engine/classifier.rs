use crate::engine::normalizer::Deviation;
use crate::engine::settings::HysteresisConfig;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    AboveOn,
    BelowOff,
    Between,
}

/// Maps a deviation onto the hysteresis bands. Degraded samples are never
/// evidence either way.
pub fn classify(deviation: Deviation, hysteresis: &HysteresisConfig) -> Classification {
    if deviation.degraded {
        return Classification::Between;
    }
    if deviation.z >= hysteresis.k_on {
        Classification::AboveOn
    } else if deviation.z <= hysteresis.k_off {
        Classification::BelowOff
    } else {
        Classification::Between
    }
}
