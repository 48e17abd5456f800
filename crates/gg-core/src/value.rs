//! Values reported by devices and carried as command targets

use serde::{Deserialize, Serialize};

/// The payload of a [`Value`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for Reading {
    fn from(b: bool) -> Self {
        Reading::Bool(b)
    }
}

impl From<f64> for Reading {
    fn from(n: f64) -> Self {
        Reading::Number(n)
    }
}

impl From<&str> for Reading {
    fn from(s: &str) -> Self {
        Reading::Text(s.to_string())
    }
}

/// A reading plus its physical unit
///
/// Used both to report sensor/actuator state and to carry thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Value {
    #[serde(default)]
    pub value: Option<Reading>,

    #[serde(default)]
    pub units: String,

    /// Status snapshot of an output device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

impl Value {
    /// Create a numeric value with units
    pub fn number(value: f64, units: impl Into<String>) -> Self {
        Self {
            value: Some(Reading::Number(value)),
            units: units.into(),
            output: None,
        }
    }

    /// Create a boolean value with units
    pub fn boolean(value: bool, units: impl Into<String>) -> Self {
        Self {
            value: Some(Reading::Bool(value)),
            units: units.into(),
            output: None,
        }
    }

    /// Attach an output status snapshot
    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = Some(output);
        self
    }

    /// Numeric view of the reading; booleans and text never compare
    pub fn as_f64(&self) -> Option<f64> {
        match self.value {
            Some(Reading::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            Some(Reading::Bool(b)) => Some(b),
            _ => None,
        }
    }
}

impl From<Reading> for Value {
    fn from(reading: Reading) -> Self {
        Self {
            value: Some(reading),
            ..Self::default()
        }
    }
}
