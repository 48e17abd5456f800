//! Capabilities a Gadget drives
//!
//! Everything device specific sits behind these two traits so that the
//! Gadget state machine can be exercised with fakes.

use async_trait::async_trait;
use gg_core::{Message, Value};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by devices
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("device rejected value: {0}")]
    InvalidValue(String),

    #[error("device unavailable: {0}")]
    Unavailable(String),
}

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// A device the system writes to (pin, heater, thermostat)
pub trait OutputDevice: Send {
    /// Switch the device on, `value` is the target carried by the command
    fn on(&mut self, value: Option<&Value>) -> DeviceResult<()>;

    fn off(&mut self) -> DeviceResult<()>;

    /// React to an update while on, e.g. a heater watching a thermometer
    fn update(&mut self, msg: &Message);

    /// Snapshot embedded in the Gadget's status updates
    fn status(&self) -> serde_json::Value;
}

/// A device the system reads from (switch, thermometer)
#[async_trait]
pub trait InputDevice: Send {
    /// The current reading
    fn value(&self) -> Value;

    /// Produce readings on `values` until `inbox` closes
    ///
    /// The Gadget forwards every bus message it receives to `inbox`.
    async fn run(self: Box<Self>, inbox: mpsc::Receiver<Message>, values: mpsc::Sender<Value>);
}
