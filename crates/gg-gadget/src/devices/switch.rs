use async_trait::async_trait;
use gg_core::{Message, Reading, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error};

use crate::device::{DeviceResult, InputDevice};

/// Signal bounce after an edge is ignored for this long
pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// Blocks until a digital input changes
#[async_trait]
pub trait Poller: Send {
    /// Wait for the next edge and return the new level
    ///
    /// Must be cancel-safe; the switch drops the future when its inbox
    /// receives a message.
    async fn wait(&mut self) -> DeviceResult<bool>;

    /// The current level
    fn status(&self) -> bool;
}

/// An input that reports a value whenever a digital level changes
///
/// The true value is either a boolean or a number; the false value is
/// `false` or `0` to match.
pub struct Switch {
    poller: Box<dyn Poller>,
    true_value: Reading,
    false_value: Reading,
    units: String,
    value: Reading,
}

impl Switch {
    pub fn new(poller: Box<dyn Poller>, true_value: Reading, units: impl Into<String>) -> Self {
        let false_value = match true_value {
            Reading::Bool(_) => Reading::Bool(false),
            _ => Reading::Number(0.0),
        };
        let value = if poller.status() {
            true_value.clone()
        } else {
            false_value.clone()
        };
        Self {
            poller,
            true_value,
            false_value,
            units: units.into(),
            value,
        }
    }

    fn reading(&self, level: bool) -> Reading {
        if level {
            self.true_value.clone()
        } else {
            self.false_value.clone()
        }
    }
}

#[async_trait]
impl InputDevice for Switch {
    fn value(&self) -> Value {
        Value {
            value: Some(self.value.clone()),
            units: self.units.clone(),
            output: None,
        }
    }

    async fn run(self: Box<Self>, mut inbox: mpsc::Receiver<Message>, values: mpsc::Sender<Value>) {
        let mut switch = *self;
        loop {
            tokio::select! {
                msg = inbox.recv() => {
                    if msg.is_none() {
                        break;
                    }
                }
                edge = switch.poller.wait() => match edge {
                    Ok(level) => {
                        switch.value = switch.reading(level);
                        if values.send(switch.value()).await.is_err() {
                            break;
                        }
                        sleep(DEBOUNCE).await;
                    }
                    Err(e) => {
                        error!(error = %e, "Switch stopped polling");
                        break;
                    }
                }
            }
        }
        debug!("Switch stopped");
    }
}
