use gg_core::{Message, Value};
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::device::{DeviceResult, OutputDevice};

/// Minimum time between two switches of the driver
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Whether the driven appliance heats or cools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThermostatMode {
    #[default]
    Heater,
    Cooler,
}

/// Keeps a furnace (or cooler) between two temperatures
///
/// Reacts only to updates whose sender is the configured sensor. In heater
/// mode the driver is switched off at or above `high` and on at or below
/// `low`; cooler mode is the mirror image.
pub struct Thermostat {
    driver: Box<dyn OutputDevice>,
    sensor: String,
    high: f64,
    low: f64,
    mode: ThermostatMode,
    min_interval: Duration,
    last_change: Option<Instant>,
    on: bool,
}

impl Thermostat {
    pub fn new(
        driver: Box<dyn OutputDevice>,
        sensor: impl Into<String>,
        low: f64,
        high: f64,
        mode: ThermostatMode,
    ) -> Self {
        Self {
            driver,
            sensor: sensor.into(),
            high,
            low,
            mode,
            min_interval: DEFAULT_MIN_INTERVAL,
            last_change: None,
            on: false,
        }
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Whether the driver should be on (`Some(true)`), off, or left alone
    fn decide(&self, temperature: f64) -> Option<bool> {
        match self.mode {
            ThermostatMode::Heater if temperature >= self.high => Some(false),
            ThermostatMode::Heater if temperature <= self.low => Some(true),
            ThermostatMode::Cooler if temperature <= self.low => Some(false),
            ThermostatMode::Cooler if temperature >= self.high => Some(true),
            _ => None,
        }
    }
}

impl OutputDevice for Thermostat {
    fn on(&mut self, _value: Option<&Value>) -> DeviceResult<()> {
        self.driver.on(None)?;
        self.on = true;
        Ok(())
    }

    fn off(&mut self) -> DeviceResult<()> {
        if self.on {
            self.on = false;
            self.driver.off()?;
        }
        Ok(())
    }

    fn update(&mut self, msg: &Message) {
        if msg.sender != self.sensor {
            return;
        }
        let now = Instant::now();
        if self
            .last_change
            .is_some_and(|last| now.duration_since(last) < self.min_interval)
        {
            return;
        }
        let Some(temperature) = msg.value.as_f64() else {
            return;
        };
        if !self.on {
            return;
        }

        let result = match self.decide(temperature) {
            Some(true) => self.driver.on(None),
            Some(false) => self.driver.off(),
            None => return,
        };
        match result {
            Ok(()) => {
                debug!(sensor = %self.sensor, temperature, "Thermostat switched driver");
                self.last_change = Some(now);
            }
            Err(e) => error!(sensor = %self.sensor, error = %e, "Thermostat failed to switch driver"),
        }
    }

    fn status(&self) -> serde_json::Value {
        json!(self.on)
    }
}
