use crate::error::AppError;
use crate::sensor::EnergySource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockReading {
    Energy(f64),
    Fail,
}

/// Replays a fixed script of readings, then repeats the last one.
#[derive(Debug, Clone)]
pub struct MockEnergySource {
    script: Vec<MockReading>,
    next_index: usize,
}

impl MockEnergySource {
    pub fn new(script: Vec<MockReading>) -> Self {
        Self {
            script,
            next_index: 0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![MockReading::Energy(value)])
    }

    pub fn from_values(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(MockReading::Energy).collect())
    }

    fn next_reading(&mut self) -> MockReading {
        let reading = self
            .script
            .get(self.next_index)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or(MockReading::Fail);
        self.next_index += 1;
        reading
    }
}

impl EnergySource for MockEnergySource {
    fn read_energy(&mut self) -> Result<f64, AppError> {
        match self.next_reading() {
            MockReading::Energy(value) => Ok(value),
            MockReading::Fail => Err(AppError::Sensor("mock read energy failed".to_string())),
        }
    }
}
