pub mod app;
pub mod config;
mod logging;
mod telemetry;

pub use app::{run, run_from_args};
pub use config::RuntimeConfig;
