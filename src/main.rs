use bed_presence::engine::PresenceEngine;
use bed_presence::sensor::replay::ReplaySource;
use bed_presence::{api, config, state, tick};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(config.log_level()?);
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "bed-presence starting"
    );

    let settings = config.engine_settings()?;
    let input_range = config.input_range()?;
    tracing::info!(
        mu = settings.baseline().mu,
        sigma = settings.baseline().sigma,
        k_on = settings.hysteresis().k_on,
        k_off = settings.hysteresis().k_off,
        debounce_occupied_ms = settings.debounce().debounce_occupied_ms,
        debounce_vacant_ms = settings.debounce().debounce_vacant_ms,
        abs_clear_delay_ms = settings.debounce().abs_clear_delay_ms,
        on_threshold = settings.on_threshold(),
        off_threshold = settings.off_threshold(),
        "Presence engine configured"
    );
    let engine = PresenceEngine::new(settings, input_range);
    let state = Arc::new(RwLock::new(state::AppState::new(engine)));

    let stop_flag = Arc::new(AtomicBool::new(false));
    let tick_handle = match config.replay_path() {
        Some(path) => match ReplaySource::from_path(path) {
            Ok(source) => {
                let interval = config.poll_interval();
                tracing::info!(
                    path = %path.display(),
                    values = source.len(),
                    interval_ms = interval.as_millis(),
                    "Starting tick thread from replay source"
                );
                Some(tick::spawn_tick_thread(
                    source,
                    Arc::clone(&state),
                    interval,
                    Arc::clone(&stop_flag),
                ))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load replay source");
                None
            }
        },
        None => {
            tracing::warn!("Tick thread not started - no energy source configured");
            None
        }
    };

    let app = api::router(Arc::clone(&state));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    stop_flag.store(true, Ordering::Relaxed);
    if let Some(handle) = tick_handle
        && handle.join().is_err()
    {
        tracing::warn!("Tick thread panicked");
    }

    Ok(())
}
