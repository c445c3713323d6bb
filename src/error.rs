use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("replay source error: {0}")]
    Replay(String),
    #[error("state lock poisoned")]
    StateLock,
}
