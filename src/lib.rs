pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod sensor;
pub mod state;
pub mod tick;
