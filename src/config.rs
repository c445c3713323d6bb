use crate::engine::settings::{
    DEFAULT_ABS_CLEAR_DELAY_MS, DEFAULT_DEBOUNCE_OCCUPIED_MS, DEFAULT_DEBOUNCE_VACANT_MS,
    DEFAULT_K_OFF, DEFAULT_K_ON, DEFAULT_MU, DEFAULT_SIGMA,
};
use crate::engine::{
    Baseline, DebounceConfig, EngineSettings, HysteresisConfig, InputRange, SettingsError,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub engine: Option<EngineSection>,
    #[serde(default)]
    pub sensor: Option<SensorSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

/// Initial engine tunables. Unset fields take the documented defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineSection {
    pub mu: Option<f64>,
    pub sigma: Option<f64>,
    pub k_on: Option<f64>,
    pub k_off: Option<f64>,
    pub debounce_occupied_ms: Option<i64>,
    pub debounce_vacant_ms: Option<i64>,
    pub abs_clear_delay_ms: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SensorSection {
    /// Text file of energy values to replay in place of the radar
    pub replay_path: Option<PathBuf>,
    /// Poll interval in milliseconds (default: 500)
    pub poll_interval_ms: Option<u64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid [engine] settings: {0}")]
    Engine(#[from] SettingsError),
    #[error("invalid [sensor] range: min {min} must be below max {max}")]
    InputRange { min: f64, max: f64 },
    #[error("unknown logging level: {0}")]
    LogLevel(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    /// Builds the startup settings through the same validation as runtime updates.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let section = self.engine.clone().unwrap_or_default();
        let baseline = Baseline::new(
            section.mu.unwrap_or(DEFAULT_MU),
            section.sigma.unwrap_or(DEFAULT_SIGMA),
        )?;
        let hysteresis = HysteresisConfig::new(
            section.k_on.unwrap_or(DEFAULT_K_ON),
            section.k_off.unwrap_or(DEFAULT_K_OFF),
        )?;
        let debounce = DebounceConfig::from_signed(
            section
                .debounce_occupied_ms
                .unwrap_or(DEFAULT_DEBOUNCE_OCCUPIED_MS as i64),
            section
                .debounce_vacant_ms
                .unwrap_or(DEFAULT_DEBOUNCE_VACANT_MS as i64),
            section
                .abs_clear_delay_ms
                .unwrap_or(DEFAULT_ABS_CLEAR_DELAY_MS as i64),
        )?;
        Ok(EngineSettings::new(baseline, hysteresis, debounce)?)
    }

    pub fn input_range(&self) -> Result<InputRange, ConfigError> {
        let default = InputRange::default();
        let sensor = self.sensor.as_ref();
        let min = sensor.and_then(|s| s.min_value).unwrap_or(default.min());
        let max = sensor.and_then(|s| s.max_value).unwrap_or(default.max());
        InputRange::new(min, max).map_err(|_| ConfigError::InputRange { min, max })
    }

    pub fn replay_path(&self) -> Option<&Path> {
        let path = self.sensor.as_ref()?.replay_path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /// Returns the poll interval as Duration (default: 500 ms)
    pub fn poll_interval(&self) -> Duration {
        let millis = self
            .sensor
            .as_ref()
            .and_then(|s| s.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        Duration::from_millis(millis)
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        self.logging
            .level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.logging.level.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_temp(name: &str, contents: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = std::env::temp_dir().join(format!("bed-presence-{name}-{unique}.toml"));
        fs::write(&path, contents)?;
        Ok(path)
    }

    const MINIMAL: &str = r#"
[app]
name = "bed-presence"

[logging]
level = "info"
"#;

    #[test]
    fn default_config_is_valid() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/config/config.toml"))?;

        let settings = config.engine_settings()?;
        assert_eq!(settings.hysteresis(), HysteresisConfig::default());
        assert!(config.input_range().is_ok());
        assert!(config.log_level().is_ok());
        Ok(())
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp("minimal", MINIMAL)?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);
        let config = result?;

        assert_eq!(config.engine_settings()?, EngineSettings::default());
        assert_eq!(config.input_range()?, InputRange::default());
        assert!(config.replay_path().is_none());
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.server_port(), DEFAULT_SERVER_PORT);
        Ok(())
    }

    #[test]
    fn engine_section_overrides_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let contents = format!(
            "{MINIMAL}\n[engine]\nmu = 8.0\nsigma = 2.0\nk_on = 5.0\ndebounce_vacant_ms = 7000\n"
        );
        let path = write_temp("engine", &contents)?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);
        let settings = result?.engine_settings()?;

        assert_eq!(settings.baseline(), Baseline { mu: 8.0, sigma: 2.0 });
        assert_eq!(settings.hysteresis().k_on, 5.0);
        assert_eq!(settings.hysteresis().k_off, DEFAULT_K_OFF);
        assert_eq!(settings.debounce().debounce_vacant_ms, 7000);
        Ok(())
    }

    #[test]
    fn inverted_engine_section_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let contents = format!("{MINIMAL}\n[engine]\nk_on = 1.0\nk_off = 2.0\n");
        let path = write_temp("inverted", &contents)?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(
            result?.engine_settings(),
            Err(ConfigError::Engine(SettingsError::InvertedHysteresis { .. }))
        ));
        Ok(())
    }

    #[test]
    fn negative_duration_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let contents = format!("{MINIMAL}\n[engine]\nabs_clear_delay_ms = -5\n");
        let path = write_temp("negative", &contents)?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(
            result?.engine_settings(),
            Err(ConfigError::Engine(SettingsError::NegativeDuration { .. }))
        ));
        Ok(())
    }

    #[test]
    fn inverted_input_range_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let contents = format!("{MINIMAL}\n[sensor]\nmin_value = 50.0\nmax_value = 10.0\n");
        let path = write_temp("range", &contents)?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(
            result?.input_range(),
            Err(ConfigError::InputRange { .. })
        ));
        Ok(())
    }

    #[test]
    fn empty_replay_path_is_treated_as_missing() -> Result<(), Box<dyn std::error::Error>> {
        let contents = format!("{MINIMAL}\n[sensor]\nreplay_path = \"\"\n");
        let path = write_temp("replay", &contents)?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(result?.replay_path().is_none());
        Ok(())
    }

    #[test]
    fn unknown_log_level_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let contents = MINIMAL.replace("info", "chatty");
        let path = write_temp("level", &contents)?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result?.log_level(), Err(ConfigError::LogLevel(_))));
        Ok(())
    }

    #[test]
    fn missing_config_file_returns_read_error() {
        let path = std::env::temp_dir().join("bed-presence-config-does-not-exist.toml");

        let result = load_from_path(&path);

        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn invalid_toml_returns_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp("invalid", "not = [valid")?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        Ok(())
    }
}
