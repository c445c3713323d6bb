use crate::engine::{
    Baseline, DebounceConfig, EngineSettings, HysteresisConfig, PresenceDecision, PresenceEngine,
    Sample, SettingsError,
};
use std::time::SystemTime;
use tokio::sync::watch;

/// Latest engine output, as published to downstream consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceReport {
    pub decision: PresenceDecision,
    pub timestamp: SystemTime,
}

#[derive(Debug)]
pub struct AppState {
    engine: PresenceEngine,
    presence: Option<PresenceReport>,
    presence_tx: watch::Sender<Option<PresenceReport>>,
}

impl AppState {
    pub fn new(engine: PresenceEngine) -> Self {
        let (presence_tx, _presence_rx) = watch::channel(None);
        Self {
            engine,
            presence: None,
            presence_tx,
        }
    }

    pub fn engine(&self) -> &PresenceEngine {
        &self.engine
    }

    pub fn settings(&self) -> &EngineSettings {
        self.engine.settings()
    }

    pub fn presence(&self) -> Option<&PresenceReport> {
        self.presence.as_ref()
    }

    pub fn subscribe_presence(&self) -> watch::Receiver<Option<PresenceReport>> {
        self.presence_tx.subscribe()
    }

    /// Runs one tick and publishes the result.
    pub fn apply_sample(&mut self, sample: Sample, timestamp: SystemTime) -> PresenceReport {
        let decision = self.engine.apply_sample(sample);
        let report = PresenceReport {
            decision,
            timestamp,
        };
        self.presence = Some(report.clone());
        self.presence_tx.send_replace(Some(report.clone()));
        report
    }

    pub fn set_baseline(&mut self, mu: f64, sigma: f64) -> Result<Baseline, SettingsError> {
        self.engine.set_baseline(mu, sigma)
    }

    pub fn set_hysteresis(
        &mut self,
        k_on: f64,
        k_off: f64,
    ) -> Result<HysteresisConfig, SettingsError> {
        self.engine.set_hysteresis(k_on, k_off)
    }

    pub fn set_debounce(&mut self, debounce: DebounceConfig) -> DebounceConfig {
        self.engine.set_debounce(debounce)
    }

    pub fn reset_to_defaults(&mut self) {
        self.engine.reset_to_defaults();
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PresenceEngine::with_defaults())
    }
}
