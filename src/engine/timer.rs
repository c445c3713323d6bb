/// Millisecond timestamp on the engine's monotonic clock.
pub type Millis = u64;

/// Sustained-condition timer. Breaking the condition cancels it, so
/// interrupted runs never accumulate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceTimer {
    started_at: Option<Millis>,
}

impl DebounceTimer {
    /// No-op while already running.
    pub fn start(&mut self, now: Millis) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn cancel(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<Millis> {
        self.started_at
    }

    pub fn elapsed(&self, now: Millis, duration_ms: u64) -> bool {
        match self.started_at {
            Some(started_at) => now.saturating_sub(started_at) >= duration_ms,
            None => false,
        }
    }
}

/// Failsafe against an occupancy that is never reinforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watchdog {
    last_reinforced_at: Option<Millis>,
}

impl Watchdog {
    pub fn reinforce(&mut self, now: Millis) {
        self.last_reinforced_at = Some(now);
    }

    pub fn disarm(&mut self) {
        self.last_reinforced_at = None;
    }

    pub fn last_reinforced_at(&self) -> Option<Millis> {
        self.last_reinforced_at
    }

    /// True once `abs_clear_delay_ms` has passed without reinforcement. A
    /// disarmed watchdog never fires.
    pub fn expired(&self, now: Millis, abs_clear_delay_ms: u64) -> bool {
        match self.last_reinforced_at {
            Some(last) => now.saturating_sub(last) >= abs_clear_delay_ms,
            None => false,
        }
    }
}
