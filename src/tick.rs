use crate::engine::{Millis, Sample};
use crate::error::AppError;
use crate::sensor::EnergySource;
use crate::state::{AppState, PresenceReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// Reads one value and runs one engine tick. A failed read skips the tick
/// and leaves the engine untouched.
pub fn run_tick<S>(
    source: &mut S,
    state: &Arc<RwLock<AppState>>,
    now: Millis,
) -> Result<PresenceReport, AppError>
where
    S: EnergySource + ?Sized,
{
    run_tick_at(source, state, now, SystemTime::now())
}

fn run_tick_at<S>(
    source: &mut S,
    state: &Arc<RwLock<AppState>>,
    now: Millis,
    timestamp: SystemTime,
) -> Result<PresenceReport, AppError>
where
    S: EnergySource + ?Sized,
{
    let value = source.read_energy()?;
    let sample = Sample {
        value,
        observed_at: now,
    };

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    let previous = guard.engine().state();
    let report = guard.apply_sample(sample, timestamp);
    drop(guard);

    if report.decision.state != previous {
        info!(
            occupied = report.decision.occupied,
            state = ?report.decision.state,
            reason = %report.decision.reason,
            "Presence state changed"
        );
    } else {
        debug!(
            value,
            z = report.decision.z,
            reason = %report.decision.reason,
            "Tick"
        );
    }
    Ok(report)
}

pub fn spawn_tick_thread<S>(
    mut source: S,
    state: Arc<RwLock<AppState>>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()>
where
    S: EnergySource + Send + 'static,
{
    std::thread::spawn(move || {
        let started = Instant::now();

        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();
            let now = millis_since(started, cycle_start);

            if let Err(err) = run_tick(&mut source, &state, now) {
                warn!(error = %err, "Tick skipped");
            }

            sleep_with_stop(interval, &stop, cycle_start);
        }
        info!("Tick thread stopped");
    })
}

fn millis_since(start: Instant, now: Instant) -> Millis {
    u64::try_from(now.saturating_duration_since(start).as_millis()).unwrap_or(Millis::MAX)
}

fn sleep_with_stop(duration: Duration, stop: &AtomicBool, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed >= duration {
        return;
    }
    let remaining = duration - elapsed;
    let step = Duration::from_millis(50).min(remaining);
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step);
        slept += step;
    }
}
