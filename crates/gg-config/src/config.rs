//! System configuration
//!
//! One YAML document describes every gadget plus the runner, cron, bus and
//! logging settings:
//!
//! ```yaml
//! gadgets:
//!   - location: living room
//!     name: lamp
//!     device:
//!       type: log
//! cron:
//!   jobs:
//!     - "30 22 * * * turn off living room lamp"
//! ```

use gg_core::{Argument, Comparison, UnitClass};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Uid the cron scheduler subscribes under
const CRON_UID: &str = "cron";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub gadgets: Vec<GadgetConfig>,

    #[serde(default)]
    pub cron: CronConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// A single gadget and the device behind it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GadgetConfig {
    pub location: String,
    pub name: String,

    /// Bus identity, defaults to `"<location> <name>"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_command: Option<String>,

    /// RCL command applied when the gadget starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,

    /// Comparison used for volume auto-off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Comparison>,

    #[serde(default)]
    pub units: String,

    /// Only forward updates from the gadget's own location to the device
    #[serde(default)]
    pub filter_messages: bool,

    pub device: DeviceConfig,
}

impl GadgetConfig {
    pub fn uid(&self) -> String {
        self.uid
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.location, self.name))
    }

    pub fn on_command(&self) -> String {
        self.on_command
            .clone()
            .unwrap_or_else(|| format!("turn on {} {}", self.location, self.name))
    }

    pub fn off_command(&self) -> String {
        self.off_command
            .clone()
            .unwrap_or_else(|| format!("turn off {} {}", self.location, self.name))
    }

    /// An initial on-command with an argument must carry a usable one
    fn check_initial_value(&self, initial: &str) -> Result<(), String> {
        let on = self.on_command();
        if !initial.starts_with(&on) || initial.trim().len() <= on.len() {
            return Ok(());
        }

        let argument = match Argument::from_command(initial) {
            Ok(Some(argument)) => argument,
            Ok(None) => return Err(format!("'{initial}' has no for/to argument")),
            Err(e) => return Err(e.to_string()),
        };
        match argument.class() {
            Ok(UnitClass::Time) if argument.duration().is_none() => {
                Err(format!("'{initial}' has a negative duration"))
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Output device selection, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeviceConfig {
    /// Dry-run driver that only logs
    Log,

    Heater {
        #[serde(default)]
        pwm: bool,
    },

    Thermostat {
        /// Uid of the temperature sensor to follow
        sensor: String,
        low: f64,
        high: f64,
        #[serde(default)]
        mode: ThermostatModeConfig,
        #[serde(default = "default_min_interval_secs")]
        min_interval_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermostatModeConfig {
    #[default]
    Heater,
    Cooler,
}

/// Cron scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronConfig {
    #[serde(default)]
    pub jobs: Vec<String>,

    /// Tick interval in milliseconds
    #[serde(default = "default_sleep_ms")]
    pub sleep_ms: u64,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            jobs: Vec::new(),
            sleep_ms: default_sleep_ms(),
        }
    }
}

/// Method runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_runner_uid")]
    pub uid: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            uid: default_runner_uid(),
        }
    }
}

/// Message bus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Capacity of the shared outbox
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_min_interval_secs() -> u64 {
    300
}

fn default_sleep_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_runner_uid() -> String {
    "runner".to_string()
}

fn default_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl SystemConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseYaml {
            path: "<string>".into(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bus.capacity == 0 {
            return Err(invalid("bus.capacity", "must be greater than 0"));
        }
        if self.cron.sleep_ms == 0 {
            return Err(invalid("cron.sleep_ms", "must be greater than 0"));
        }
        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(invalid(
                "log.level",
                &format!("unknown level '{}'", self.log.level),
            ));
        }

        let mut uids = HashSet::new();
        uids.insert(CRON_UID.to_string());
        if self.runner.enabled {
            if self.runner.uid.trim().is_empty() {
                return Err(invalid("runner.uid", "must not be empty"));
            }
            if !uids.insert(self.runner.uid.clone()) {
                return Err(duplicate(&self.runner.uid));
            }
        }

        for (i, gadget) in self.gadgets.iter().enumerate() {
            if gadget.location.trim().is_empty() {
                return Err(invalid(&format!("gadgets[{i}].location"), "must not be empty"));
            }
            if gadget.name.trim().is_empty() {
                return Err(invalid(&format!("gadgets[{i}].name"), "must not be empty"));
            }
            if let Some(operator) = gadget.operator {
                if !matches!(operator, Comparison::Le | Comparison::Ge) {
                    return Err(invalid(
                        &format!("gadgets[{i}].operator"),
                        &format!("'{operator}' is not one of '<=' or '>='"),
                    ));
                }
            }
            if let Some(initial) = &gadget.initial_value {
                if let Err(reason) = gadget.check_initial_value(initial) {
                    return Err(invalid(&format!("gadgets[{i}].initial_value"), &reason));
                }
            }
            if let DeviceConfig::Thermostat { low, high, .. } = gadget.device {
                if low >= high {
                    return Err(invalid(
                        &format!("gadgets[{i}].device"),
                        &format!("low ({low}) must be below high ({high})"),
                    ));
                }
            }
            let uid = gadget.uid();
            if !uids.insert(uid.clone()) {
                return Err(duplicate(&uid));
            }
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn duplicate(uid: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        message: format!("duplicate uid '{uid}'"),
    }
}
