//! File-backed energy source for running the service without a radar.
//!
//! One value per line; blank lines and lines starting with `#` are skipped.
//! Playback loops back to the first value after the last one.

use crate::error::AppError;
use crate::sensor::EnergySource;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ReplaySource {
    values: Vec<f64>,
    position: usize,
}

impl ReplaySource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|err| AppError::Replay(format!("{}: {err}", path.display())))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, AppError> {
        let mut values = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let value = line.parse::<f64>().map_err(|err| {
                AppError::Replay(format!("line {}: {line:?}: {err}", index + 1))
            })?;
            values.push(value);
        }
        if values.is_empty() {
            return Err(AppError::Replay("no energy values found".to_string()));
        }
        Ok(Self {
            values,
            position: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl EnergySource for ReplaySource {
    fn read_energy(&mut self) -> Result<f64, AppError> {
        let value = self
            .values
            .get(self.position)
            .copied()
            .ok_or_else(|| AppError::Replay("replay exhausted".to_string()))?;
        self.position = (self.position + 1) % self.values.len();
        Ok(value)
    }
}
