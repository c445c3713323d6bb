use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post, put};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/presence", get(handlers::get_presence))
        .route("/api/health", get(handlers::get_health))
        .route("/api/settings", get(handlers::get_settings))
        .route("/api/baseline", put(handlers::put_baseline))
        .route("/api/hysteresis", put(handlers::put_hysteresis))
        .route("/api/debounce", put(handlers::put_debounce))
        .route("/api/reset", post(handlers::post_reset))
        .with_state(state)
}
