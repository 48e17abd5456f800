//! The Gadget actor
//!
//! A Gadget represents one physical device. Output gadgets run an on/off
//! state machine driven by RCL commands; an on-command may arm an auto-off,
//! either a timer (`"turn on heater for 5 minutes"`) or a comparator over
//! later volume updates (`"fill tank for 10 liters"`). Input gadgets publish
//! the readings their device produces.

use async_trait::async_trait;
use gg_bus::{publish, Actor, Inbox, Outbox, Timer};
use gg_core::{commands, Argument, Comparison, Direction, Info, Message, UnitClass, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::device::{InputDevice, OutputDevice};

/// Capacity of the channels between an input gadget and its device
const DEVICE_QUEUE: usize = 16;

/// On/off state of an output gadget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Off,
    On,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Off => f.write_str("off"),
            Status::On => f.write_str("on"),
        }
    }
}

/// Auto-off predicate armed by a volume argument
#[derive(Debug, Clone, PartialEq)]
struct Comparator {
    location: String,
    name: &'static str,
    operator: Comparison,
    threshold: f64,
}

impl Comparator {
    /// True for an update from the monitored device crossing the threshold
    fn matches(&self, msg: &Message, own_uid: &str) -> bool {
        if msg.sender == own_uid || msg.location != self.location || msg.name != self.name {
            return false;
        }
        msg.value
            .as_f64()
            .is_some_and(|v| self.operator.apply(v, self.threshold))
    }
}

/// What an accepted on-command arms
enum AutoOff {
    Nothing,
    After(Duration),
    When(Comparator),
}

enum Device {
    Output(Box<dyn OutputDevice>),
    /// Taken when the input loop starts
    Input(Option<Box<dyn InputDevice>>),
}

/// Builder for [`Gadget`]
#[derive(Debug, Clone, Default)]
pub struct GadgetBuilder {
    location: String,
    name: String,
    uid: Option<String>,
    on_command: Option<String>,
    off_command: Option<String>,
    initial_value: Option<String>,
    operator: Option<Comparison>,
    units: String,
    filter_messages: bool,
}

impl GadgetBuilder {
    /// Create a new builder for the device at `location`/`name`
    pub fn new(location: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Override the `"<location> <name>"` identity
    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn on_command(mut self, cmd: impl Into<String>) -> Self {
        self.on_command = Some(cmd.into());
        self
    }

    pub fn off_command(mut self, cmd: impl Into<String>) -> Self {
        self.off_command = Some(cmd.into());
        self
    }

    /// RCL command applied when an output gadget starts
    pub fn initial_value(mut self, cmd: impl Into<String>) -> Self {
        self.initial_value = Some(cmd.into());
        self
    }

    /// Operator used by volume comparators
    pub fn operator(mut self, operator: Comparison) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Only forward updates from the gadget's own location to the device
    pub fn filter_messages(mut self, filter: bool) -> Self {
        self.filter_messages = filter;
        self
    }

    /// Build an output gadget
    pub fn output(self, device: Box<dyn OutputDevice>) -> Gadget {
        let on = self
            .on_command
            .clone()
            .unwrap_or_else(|| format!("turn on {} {}", self.location, self.name));
        let off = self
            .off_command
            .clone()
            .unwrap_or_else(|| format!("turn off {} {}", self.location, self.name));
        self.build(Device::Output(device), on, off)
    }

    /// Build an input gadget; input gadgets ignore on/off commands
    pub fn input(self, device: Box<dyn InputDevice>) -> Gadget {
        self.build(Device::Input(Some(device)), String::new(), String::new())
    }

    fn build(self, device: Device, on_command: String, off_command: String) -> Gadget {
        let uid = self
            .uid
            .unwrap_or_else(|| format!("{} {}", self.location, self.name));
        Gadget {
            location: self.location,
            name: self.name,
            uid,
            on_command,
            off_command,
            initial_value: self.initial_value,
            operator: self.operator,
            units: self.units,
            filter_messages: self.filter_messages,
            device,
            on: false,
            timer: Timer::new(),
            comparator: None,
            shutdown: false,
            last_value: Value::default(),
        }
    }
}

/// An actor representing one physical input or output device
pub struct Gadget {
    location: String,
    name: String,
    uid: String,
    on_command: String,
    off_command: String,
    initial_value: Option<String>,
    operator: Option<Comparison>,
    units: String,
    filter_messages: bool,
    device: Device,
    on: bool,
    /// Auto-off timer; never armed together with `comparator`
    timer: Timer,
    comparator: Option<Comparator>,
    shutdown: bool,
    /// Last reading of an input device
    last_value: Value,
}

impl Gadget {
    /// Create a new builder
    pub fn builder(location: impl Into<String>, name: impl Into<String>) -> GadgetBuilder {
        GadgetBuilder::new(location, name)
    }

    /// Create an output gadget with the default on/off commands
    pub fn output(
        location: impl Into<String>,
        name: impl Into<String>,
        device: Box<dyn OutputDevice>,
    ) -> Self {
        GadgetBuilder::new(location, name).output(device)
    }

    /// Create an input gadget
    pub fn input(
        location: impl Into<String>,
        name: impl Into<String>,
        device: Box<dyn InputDevice>,
    ) -> Self {
        GadgetBuilder::new(location, name).input(device)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn on_command(&self) -> &str {
        &self.on_command
    }

    pub fn off_command(&self) -> &str {
        &self.off_command
    }

    pub fn status(&self) -> Status {
        if self.on {
            Status::On
        } else {
            Status::Off
        }
    }

    /// True while an auto-off timer or comparator is armed
    pub fn is_armed(&self) -> bool {
        self.timer.is_armed() || self.comparator.is_some()
    }

    fn is_output(&self) -> bool {
        matches!(self.device, Device::Output(_))
    }

    /// Whether a COMMAND is meant for this gadget
    fn is_my_command(&self, msg: &Message) -> bool {
        if !msg.is_command() {
            return false;
        }
        if msg.body == commands::UPDATE || msg.body == commands::SHUTDOWN {
            return true;
        }
        self.is_output()
            && (msg.body.starts_with(&self.on_command) || msg.body.starts_with(&self.off_command))
    }

    async fn run_output(&mut self, mut inbox: Inbox, outbox: Outbox) {
        match self.initial_value.clone() {
            Some(cmd) => self.read_command(&cmd, &outbox).await,
            None => self.off(&outbox).await,
        }

        while !self.shutdown {
            tokio::select! {
                msg = inbox.recv() => match msg {
                    Some(msg) => self.read_message(&msg, &outbox).await,
                    None => break,
                },
                _ = self.timer.expired() => {
                    debug!(uid = %self.uid, "Auto-off timer fired");
                    self.off(&outbox).await;
                }
            }
        }
    }

    async fn run_input(&mut self, mut inbox: Inbox, outbox: Outbox) {
        let Device::Input(slot) = &mut self.device else {
            return;
        };
        let Some(device) = slot.take() else {
            warn!(uid = %self.uid, "Input device already started");
            return;
        };

        let (device_tx, device_rx) = mpsc::channel(DEVICE_QUEUE);
        let (values_tx, mut values_rx) = mpsc::channel(DEVICE_QUEUE);
        self.last_value = device.value();
        let task = tokio::spawn(device.run(device_rx, values_tx));

        self.send_update(None, &outbox).await;

        while !self.shutdown {
            tokio::select! {
                msg = inbox.recv() => match msg {
                    Some(msg) => {
                        if device_tx.try_send(msg.clone()).is_err() {
                            trace!(uid = %self.uid, "Device inbox full, message dropped");
                        }
                        self.read_message(&msg, &outbox).await;
                    }
                    None => break,
                },
                Some(value) = values_rx.recv() => {
                    self.last_value = value;
                    self.send_update(None, &outbox).await;
                }
            }
        }

        drop(device_tx);
        task.abort();
    }

    pub(crate) async fn read_message(&mut self, msg: &Message, outbox: &Outbox) {
        if self.is_my_command(msg) {
            self.read_command(&msg.body, outbox).await;
        } else if self.on && msg.is_update() {
            self.read_update(msg, outbox).await;
        }
    }

    async fn read_command(&mut self, body: &str, outbox: &Outbox) {
        if body == commands::SHUTDOWN {
            self.shutdown = true;
            if self.is_output() {
                self.off(outbox).await;
            }
        } else if body == commands::UPDATE {
            self.send_update(None, outbox).await;
        } else if !self.is_output() {
            trace!(uid = %self.uid, body = %body, "Input gadget ignores command");
        } else if body.starts_with(&self.on_command) {
            self.read_on_command(body, outbox).await;
        } else if body.starts_with(&self.off_command) {
            if self.on {
                self.off(outbox).await;
            } else {
                self.clear_auto_off();
            }
        }
    }

    async fn read_on_command(&mut self, body: &str, outbox: &Outbox) {
        if body.trim().len() <= self.on_command.len() {
            self.clear_auto_off();
            self.switch_on(None, outbox).await;
            return;
        }

        let argument = match Argument::from_command(body) {
            Ok(Some(argument)) => argument,
            Ok(None) => {
                warn!(uid = %self.uid, body = %body, "Ignoring command with unparsable argument");
                return;
            }
            Err(e) => {
                warn!(uid = %self.uid, body = %body, error = %e, "Ignoring command with invalid argument");
                return;
            }
        };

        let auto_off = match argument.class() {
            Ok(UnitClass::Time) => match argument.duration() {
                Some(duration) => AutoOff::After(duration),
                None => {
                    warn!(uid = %self.uid, body = %body, "Ignoring negative duration");
                    return;
                }
            },
            Ok(UnitClass::Volume) => match self.operator {
                Some(operator) => AutoOff::When(Comparator {
                    location: self.location.clone(),
                    name: UnitClass::Volume.name(),
                    operator,
                    threshold: argument.value,
                }),
                None => {
                    warn!(uid = %self.uid, "No operator configured, volume will not turn the gadget off");
                    AutoOff::Nothing
                }
            },
            Ok(UnitClass::Temperature | UnitClass::Power) => AutoOff::Nothing,
            Err(e) => {
                warn!(uid = %self.uid, body = %body, error = %e, "Ignoring command");
                return;
            }
        };

        self.clear_auto_off();
        match auto_off {
            AutoOff::Nothing => {}
            AutoOff::After(duration) => {
                debug!(uid = %self.uid, ?duration, "Arming auto-off timer");
                self.timer.arm(duration);
            }
            AutoOff::When(comparator) => {
                debug!(
                    uid = %self.uid,
                    operator = %comparator.operator,
                    threshold = comparator.threshold,
                    "Arming auto-off comparator"
                );
                self.comparator = Some(comparator);
            }
        }

        let target = Value::number(argument.value, argument.unit);
        self.switch_on(Some(target), outbox).await;
    }

    async fn read_update(&mut self, msg: &Message, outbox: &Outbox) {
        let fired = self
            .comparator
            .as_ref()
            .is_some_and(|c| c.matches(msg, &self.uid));
        if fired {
            info!(uid = %self.uid, sender = %msg.sender, "Comparator matched, turning off");
            self.off(outbox).await;
            return;
        }

        if msg.location == self.location || !self.filter_messages {
            if let Device::Output(device) = &mut self.device {
                device.update(msg);
            }
        }
    }

    fn clear_auto_off(&mut self) {
        self.timer.cancel();
        self.comparator = None;
    }

    async fn switch_on(&mut self, target: Option<Value>, outbox: &Outbox) {
        let Device::Output(device) = &mut self.device else {
            return;
        };
        if let Err(e) = device.on(target.as_ref()) {
            error!(uid = %self.uid, error = %e, "Device failed to turn on");
            self.clear_auto_off();
            return;
        }
        if !self.on {
            self.on = true;
            debug!(uid = %self.uid, "Turned on");
            self.send_update(target, outbox).await;
        }
    }

    async fn off(&mut self, outbox: &Outbox) {
        self.clear_auto_off();
        let Device::Output(device) = &mut self.device else {
            return;
        };
        if let Err(e) = device.off() {
            error!(uid = %self.uid, error = %e, "Device failed to turn off");
            return;
        }
        self.on = false;
        debug!(uid = %self.uid, "Turned off");
        self.send_update(None, outbox).await;
    }

    fn status_message(&self, target: Option<Value>) -> Message {
        let value = match &self.device {
            Device::Output(device) => {
                Value::boolean(self.on, self.units.clone()).with_output(device.status())
            }
            Device::Input(_) => self.last_value.clone(),
        };
        let direction = if self.is_output() {
            Direction::Output
        } else {
            Direction::Input
        };
        Message::update(self.uid.clone(), self.location.clone(), self.name.clone(), value)
            .with_target(target)
            .with_info(Info {
                direction,
                on: self.on_command.clone(),
                off: self.off_command.clone(),
            })
    }

    async fn send_update(&mut self, target: Option<Value>, outbox: &Outbox) {
        let msg = self.status_message(target);
        publish(outbox, msg).await;
    }
}

#[async_trait]
impl Actor for Gadget {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn direction(&self) -> Direction {
        if self.is_output() {
            Direction::Output
        } else {
            Direction::Input
        }
    }

    async fn start(&mut self, inbox: Inbox, outbox: Outbox) {
        debug!(uid = %self.uid, direction = %self.direction(), "Gadget starting");
        if self.is_output() {
            self.run_output(inbox, outbox).await;
        } else {
            self.run_input(inbox, outbox).await;
        }
        debug!(uid = %self.uid, "Gadget stopped");
    }
}
