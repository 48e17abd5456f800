use gg_core::{Message, Value};
use serde_json::json;
use tracing::info;

use crate::device::{DeviceResult, OutputDevice};

/// Dry-run output that logs instead of touching hardware
#[derive(Debug, Clone, Default)]
pub struct LogDriver {
    label: String,
    on: bool,
    value: Option<Value>,
}

impl LogDriver {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// The value passed to the last `on`
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

impl OutputDevice for LogDriver {
    fn on(&mut self, value: Option<&Value>) -> DeviceResult<()> {
        self.on = true;
        self.value = value.cloned();
        match value {
            Some(v) => info!(driver = %self.label, value = ?v.value, units = %v.units, "on"),
            None => info!(driver = %self.label, "on"),
        }
        Ok(())
    }

    fn off(&mut self) -> DeviceResult<()> {
        self.on = false;
        self.value = None;
        info!(driver = %self.label, "off");
        Ok(())
    }

    fn update(&mut self, _msg: &Message) {}

    fn status(&self) -> serde_json::Value {
        json!({ "on": self.on })
    }
}
