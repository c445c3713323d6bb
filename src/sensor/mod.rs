use crate::error::AppError;

pub mod mock;
pub mod replay;

/// Anything that yields one still-energy reading per poll. The radar driver
/// itself lives outside this crate.
pub trait EnergySource {
    fn read_energy(&mut self) -> Result<f64, AppError>;
}

