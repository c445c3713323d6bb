use crate::engine::{Baseline, Classification, DebounceConfig, HysteresisConfig, PresenceState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PresenceSuccessResponse {
    pub occupied: bool,
    pub reason: String,
    pub z: f64,
    pub state: PresenceState,
    pub classification: Classification,
    pub degraded: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Ko,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SettingsResponse {
    pub baseline: Baseline,
    pub hysteresis: HysteresisConfig,
    pub debounce: DebounceConfig,
    pub on_threshold: f64,
    pub off_threshold: f64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoData,
    InvalidSettings,
    InternalError,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct BaselineRequest {
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct HysteresisRequest {
    pub k_on: f64,
    pub k_off: f64,
}

/// Signed so that negative values reach validation instead of failing to parse.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DebounceRequest {
    pub debounce_occupied_ms: i64,
    pub debounce_vacant_ms: i64,
    pub abs_clear_delay_ms: i64,
}
