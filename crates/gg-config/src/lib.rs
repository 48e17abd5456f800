//! Configuration loading for gadgets
//!
//! Reads the YAML system description consumed by the `gadgets` binary.

mod config;
pub mod error;

pub use config::{
    BusConfig, CronConfig, DeviceConfig, GadgetConfig, LogConfig, RunnerConfig, SystemConfig,
    ThermostatModeConfig,
};
pub use error::{ConfigError, ConfigResult};
