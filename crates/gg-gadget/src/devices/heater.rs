use gg_core::{Message, UnitClass, Value};
use serde_json::json;
use tracing::{error, trace};

use crate::device::{DeviceResult, OutputDevice};

const DEFAULT_TARGET: f64 = 100.0;

/// An electric heating element holding a target temperature
///
/// Needs a thermometer publishing updates named `temperature`. With `pwm`
/// the element is driven with a duty cycle that tapers off near the target
/// so the target is not overshot; otherwise it is switched fully on below
/// the target and off at or above it.
pub struct Heater {
    driver: Box<dyn OutputDevice>,
    pwm: bool,
    target: f64,
    temperature: f64,
    on: bool,
}

impl Heater {
    pub fn new(driver: Box<dyn OutputDevice>, pwm: bool) -> Self {
        Self {
            driver,
            pwm,
            target: DEFAULT_TARGET,
            temperature: 0.0,
            on: false,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Duty cycle in percent for the current temperature
    pub fn duty(&self) -> f64 {
        let diff = self.target - self.temperature;
        if diff <= 0.0 {
            0.0
        } else if diff <= 1.0 {
            25.0
        } else if diff <= 2.0 {
            50.0
        } else {
            100.0
        }
    }

    fn drive(&mut self) -> DeviceResult<()> {
        if self.pwm {
            let duty = Value::number(self.duty(), "%");
            self.driver.on(Some(&duty))
        } else if self.target > self.temperature {
            self.driver.on(None)
        } else {
            self.driver.off()
        }
    }
}

impl OutputDevice for Heater {
    fn on(&mut self, value: Option<&Value>) -> DeviceResult<()> {
        if let Some(value) = value {
            self.target = value.as_f64().unwrap_or(DEFAULT_TARGET);
        }
        self.drive()?;
        self.on = true;
        Ok(())
    }

    fn off(&mut self) -> DeviceResult<()> {
        self.target = 0.0;
        self.on = false;
        self.driver.off()
    }

    fn update(&mut self, msg: &Message) {
        if !self.on || msg.name != UnitClass::Temperature.name() {
            return;
        }
        let Some(temperature) = msg.value.as_f64() else {
            return;
        };
        trace!(temperature, target = self.target, "Heater reading");
        self.temperature = temperature;
        if let Err(e) = self.drive() {
            error!(error = %e, "Heater failed to drive element");
        }
    }

    fn status(&self) -> serde_json::Value {
        json!({
            "on": self.on,
            "target": self.target,
            "temperature": self.temperature,
        })
    }
}
