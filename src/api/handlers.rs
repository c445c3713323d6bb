use crate::api::responses::{
    BaselineRequest, DebounceRequest, ErrorCode, ErrorResponse, HealthStatus,
    HealthSuccessResponse, HysteresisRequest, PresenceSuccessResponse, SettingsResponse,
};
use crate::engine::{DebounceConfig, EngineSettings, SettingsError};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success { status: StatusCode, body: T },
    Error { status: StatusCode, body: ErrorResponse },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success { status, body } => (status, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_presence(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_presence_response(state)
}

pub async fn get_health(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_health_response(state, SystemTime::now())
}

pub async fn get_settings(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_settings_response(state, SystemTime::now())
}

pub async fn put_baseline(
    State(state): State<Arc<RwLock<AppState>>>,
    payload: Result<Json<BaselineRequest>, JsonRejection>,
) -> impl IntoResponse {
    match payload {
        Ok(Json(request)) => apply_baseline(state, request, SystemTime::now()),
        Err(rejection) => rejected_body("/api/baseline", rejection, SystemTime::now()),
    }
}

pub async fn put_hysteresis(
    State(state): State<Arc<RwLock<AppState>>>,
    payload: Result<Json<HysteresisRequest>, JsonRejection>,
) -> impl IntoResponse {
    match payload {
        Ok(Json(request)) => apply_hysteresis(state, request, SystemTime::now()),
        Err(rejection) => rejected_body("/api/hysteresis", rejection, SystemTime::now()),
    }
}

pub async fn put_debounce(
    State(state): State<Arc<RwLock<AppState>>>,
    payload: Result<Json<DebounceRequest>, JsonRejection>,
) -> impl IntoResponse {
    match payload {
        Ok(Json(request)) => apply_debounce(state, request, SystemTime::now()),
        Err(rejection) => rejected_body("/api/debounce", rejection, SystemTime::now()),
    }
}

pub async fn post_reset(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    apply_reset(state, SystemTime::now())
}

fn build_presence_response(state: Arc<RwLock<AppState>>) -> ApiResponse<PresenceSuccessResponse> {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return internal_error("/api/presence", "state lock poisoned while reading presence");
        }
    };
    let report = guard.presence().cloned();
    drop(guard);

    let Some(report) = report else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::NoData,
            "No presence decision available yet",
            SystemTime::now(),
        );
    };

    let timestamp = match format_timestamp(report.timestamp) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/presence", "timestamp formatting failure"),
    };
    let decision = report.decision;
    ApiResponse::Success {
        status: StatusCode::OK,
        body: PresenceSuccessResponse {
            occupied: decision.occupied,
            reason: decision.reason,
            z: decision.z,
            state: decision.state,
            classification: decision.classification,
            degraded: decision.degraded,
            timestamp,
        },
    }
}

fn build_health_response(
    state: Arc<RwLock<AppState>>,
    now: SystemTime,
) -> ApiResponse<HealthSuccessResponse> {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return internal_error("/api/health", "state lock poisoned while reading presence");
        }
    };
    let status = derive_health_status(&guard);
    drop(guard);

    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/health", "timestamp formatting failure"),
    };
    let status_code = match status {
        HealthStatus::Ko => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
    };

    ApiResponse::Success {
        status: status_code,
        body: HealthSuccessResponse { status, timestamp },
    }
}

fn derive_health_status(state: &AppState) -> HealthStatus {
    let Some(report) = state.presence() else {
        return HealthStatus::Ko;
    };
    if report.decision.degraded || state.settings().baseline().is_degraded() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    }
}

fn build_settings_response(
    state: Arc<RwLock<AppState>>,
    now: SystemTime,
) -> ApiResponse<SettingsResponse> {
    let settings = match state.read() {
        Ok(guard) => *guard.settings(),
        Err(_) => {
            return internal_error("/api/settings", "state lock poisoned while reading settings");
        }
    };
    settings_response(&settings, "/api/settings", now)
}

fn settings_response(
    settings: &EngineSettings,
    route: &str,
    now: SystemTime,
) -> ApiResponse<SettingsResponse> {
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error(route, "timestamp formatting failure"),
    };

    ApiResponse::Success {
        status: StatusCode::OK,
        body: SettingsResponse {
            baseline: settings.baseline(),
            hysteresis: settings.hysteresis(),
            debounce: settings.debounce(),
            on_threshold: settings.on_threshold(),
            off_threshold: settings.off_threshold(),
            timestamp,
        },
    }
}

fn apply_baseline(
    state: Arc<RwLock<AppState>>,
    request: BaselineRequest,
    now: SystemTime,
) -> ApiResponse<SettingsResponse> {
    apply_settings(state, now, "/api/baseline", |guard| {
        guard.set_baseline(request.mu, request.sigma).map(|_| ())
    })
}

fn apply_hysteresis(
    state: Arc<RwLock<AppState>>,
    request: HysteresisRequest,
    now: SystemTime,
) -> ApiResponse<SettingsResponse> {
    apply_settings(state, now, "/api/hysteresis", |guard| {
        guard.set_hysteresis(request.k_on, request.k_off).map(|_| ())
    })
}

fn apply_debounce(
    state: Arc<RwLock<AppState>>,
    request: DebounceRequest,
    now: SystemTime,
) -> ApiResponse<SettingsResponse> {
    apply_settings(state, now, "/api/debounce", |guard| {
        let debounce = DebounceConfig::from_signed(
            request.debounce_occupied_ms,
            request.debounce_vacant_ms,
            request.abs_clear_delay_ms,
        )?;
        guard.set_debounce(debounce);
        Ok(())
    })
}

fn apply_reset(state: Arc<RwLock<AppState>>, now: SystemTime) -> ApiResponse<SettingsResponse> {
    apply_settings(state, now, "/api/reset", |guard| {
        guard.reset_to_defaults();
        Ok(())
    })
}

/// Runs one settings update under the write lock and echoes the settings
/// snapshot taken under that same lock.
fn apply_settings<F>(
    state: Arc<RwLock<AppState>>,
    now: SystemTime,
    route: &str,
    update: F,
) -> ApiResponse<SettingsResponse>
where
    F: FnOnce(&mut AppState) -> Result<(), SettingsError>,
{
    let result = match state.write() {
        Ok(mut guard) => update(&mut *guard).map(|()| *guard.settings()),
        Err(_) => return internal_error(route, "state lock poisoned while applying settings"),
    };

    match result {
        Ok(applied) => settings_response(&applied, route, now),
        Err(err) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InvalidSettings,
            &err.to_string(),
            now,
        ),
    }
}

/// Malformed settings bodies get the same JSON error shape as rejected values.
fn rejected_body<T>(route: &str, rejection: JsonRejection, now: SystemTime) -> ApiResponse<T> {
    let message = rejection.body_text();
    warn!(route = route, error = %message, "Rejected malformed settings body");
    error_response(rejection.status(), ErrorCode::InvalidSettings, &message, now)
}

fn error_response<T>(
    status: StatusCode,
    error_code: ErrorCode,
    message: &str,
    now: SystemTime,
) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Error {
            status,
            body: ErrorResponse {
                error_code,
                error_message: message.to_string(),
                timestamp,
            },
        },
        Err(_) => internal_error("api", "timestamp formatting failure"),
    }
}

fn internal_error<T>(route: &str, message: &str) -> ApiResponse<T> {
    error!(route = route, message = message, "Internal error while handling request");
    let formatted = format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        "1970-01-01T00:00:00Z".to_string()
    });
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: formatted,
        },
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}
