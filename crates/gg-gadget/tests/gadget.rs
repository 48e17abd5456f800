//! Behaviour tests for the Gadget actor against fake devices

use async_trait::async_trait;
use gg_bus::{Actor, Outbox};
use gg_core::{Comparison, Message, Value};
use gg_gadget::{DeviceError, DeviceResult, Gadget, InputDevice, OutputDevice};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};

/// Output device recording every call
#[derive(Clone, Default)]
struct FakeOutput {
    calls: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl FakeOutput {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) -> DeviceResult<()> {
        self.calls.lock().unwrap().push(call.into());
        if self.fail {
            Err(DeviceError::Unavailable("pin busy".into()))
        } else {
            Ok(())
        }
    }
}

impl OutputDevice for FakeOutput {
    fn on(&mut self, value: Option<&Value>) -> DeviceResult<()> {
        match value.and_then(Value::as_f64) {
            Some(v) => self.record(format!("on {v}")),
            None => self.record("on"),
        }
    }

    fn off(&mut self) -> DeviceResult<()> {
        self.record("off")
    }

    fn update(&mut self, msg: &Message) {
        let _ = self.record(format!("update {}", msg.sender));
    }

    fn status(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Input device forwarding values fed by the test
struct FakeInput {
    initial: Value,
    feed: mpsc::Receiver<Value>,
    seen: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl InputDevice for FakeInput {
    fn value(&self) -> Value {
        self.initial.clone()
    }

    async fn run(self: Box<Self>, mut inbox: mpsc::Receiver<Message>, values: mpsc::Sender<Value>) {
        let FakeInput { mut feed, seen, .. } = *self;
        loop {
            tokio::select! {
                msg = inbox.recv() => match msg {
                    Some(msg) => {
                        let _ = seen.send(msg.body);
                    }
                    None => break,
                },
                Some(value) = feed.recv() => {
                    if values.send(value).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

struct Running {
    inbox: mpsc::UnboundedSender<Message>,
    published: mpsc::Receiver<Message>,
    handle: JoinHandle<()>,
}

impl Running {
    fn send(&self, msg: Message) {
        self.inbox.send(msg).unwrap();
    }

    fn command(&self, body: &str) {
        self.send(Message::command("tester", body));
    }

    async fn next(&mut self) -> Message {
        self.published.recv().await.unwrap()
    }
}

fn start(mut gadget: Gadget) -> Running {
    let (inbox, inbox_rx) = mpsc::unbounded_channel();
    let (outbox, published): (Outbox, _) = mpsc::channel(64);
    let handle = tokio::spawn(async move { gadget.start(inbox_rx, outbox).await });
    Running {
        inbox,
        published,
        handle,
    }
}

fn heater(device: FakeOutput) -> Gadget {
    Gadget::builder("lab", "heater")
        .on_command("turn on heater")
        .off_command("turn off heater")
        .output(Box::new(device))
}

fn volume(location: &str, value: f64) -> Message {
    Message::update(format!("{location} volume"), location, "volume", Value::number(value, "liters"))
}

#[tokio::test(start_paused = true)]
async fn test_time_argument_turns_off_after_duration() {
    let device = FakeOutput::default();
    let mut gadget = start(heater(device.clone()));

    let initial = gadget.next().await;
    assert_eq!(initial.sender, "lab heater");
    assert_eq!(initial.value.as_bool(), Some(false));

    let started = Instant::now();
    gadget.command("turn on heater for 300 seconds");

    let on = gadget.next().await;
    assert_eq!(on.value.as_bool(), Some(true));
    assert_eq!(on.target_value.as_ref().and_then(Value::as_f64), Some(300.0));
    assert_eq!(on.info.on, "turn on heater");

    let off = gadget.next().await;
    assert_eq!(off.value.as_bool(), Some(false));
    assert!(started.elapsed() >= Duration::from_secs(300));
    assert!(started.elapsed() < Duration::from_secs(301));

    assert_eq!(device.calls(), vec!["off", "on 300", "off"]);
}

#[tokio::test(start_paused = true)]
async fn test_off_command_cancels_timer() {
    let device = FakeOutput::default();
    let mut gadget = start(heater(device.clone()));
    gadget.next().await;

    gadget.command("turn on heater for 1 minute");
    assert_eq!(gadget.next().await.value.as_bool(), Some(true));

    gadget.command("turn off heater");
    assert_eq!(gadget.next().await.value.as_bool(), Some(false));

    // The cancelled timer never turns the gadget off a second time
    assert!(timeout(Duration::from_secs(120), gadget.next()).await.is_err());
    assert_eq!(device.calls(), vec!["off", "on 1", "off"]);
}

#[tokio::test]
async fn test_volume_comparator() {
    let device = FakeOutput::default();
    let valve = Gadget::builder("tank", "valve")
        .on_command("fill tank")
        .off_command("stop filling tank")
        .operator(Comparison::Ge)
        .output(Box::new(device.clone()));
    let mut gadget = start(valve);
    gadget.next().await;

    gadget.command("fill tank for 10 liters");
    assert_eq!(gadget.next().await.value.as_bool(), Some(true));

    // Wrong location, then below the threshold
    gadget.send(volume("garage", 20.0));
    gadget.send(volume("tank", 9.5));
    gadget.command("update");
    assert_eq!(gadget.next().await.value.as_bool(), Some(true));

    gadget.send(volume("tank", 10.0));
    assert_eq!(gadget.next().await.value.as_bool(), Some(false));

    // Fires at most once
    gadget.command("fill tank");
    assert_eq!(gadget.next().await.value.as_bool(), Some(true));
    gadget.send(volume("tank", 12.0));
    gadget.command("update");
    assert_eq!(gadget.next().await.value.as_bool(), Some(true));
}

#[tokio::test]
async fn test_updates_forwarded_to_device_while_on() {
    let device = FakeOutput::default();
    let gadget = Gadget::builder("lab", "heater")
        .filter_messages(true)
        .output(Box::new(device.clone()));
    let mut gadget = start(gadget);
    gadget.next().await;

    // Off: nothing reaches the device
    gadget.send(Message::update("lab thermometer", "lab", "temperature", Value::number(20.0, "C")));

    gadget.command("turn on lab heater");
    gadget.next().await;

    gadget.send(Message::update("lab thermometer", "lab", "temperature", Value::number(21.0, "C")));
    gadget.send(Message::update("attic thermometer", "attic", "temperature", Value::number(30.0, "C")));
    gadget.command("update");
    gadget.next().await;

    assert_eq!(device.calls(), vec!["off", "on", "update lab thermometer"]);
}

#[tokio::test]
async fn test_device_errors_leave_state_unchanged() {
    let device = FakeOutput::failing();
    let mut gadget = start(heater(device.clone()));

    gadget.command("turn on heater for 5 minutes");
    gadget.command("update");

    let status = gadget.next().await;
    assert_eq!(status.value.as_bool(), Some(false));
    assert_eq!(device.calls(), vec!["off", "on 5"]);
}

#[tokio::test]
async fn test_initial_value_applied_on_start() {
    let device = FakeOutput::default();
    let gadget = Gadget::builder("lab", "heater")
        .initial_value("turn on lab heater to 72 F")
        .output(Box::new(device.clone()));
    let mut gadget = start(gadget);

    let first = gadget.next().await;
    assert_eq!(first.value.as_bool(), Some(true));
    assert_eq!(first.target_value.and_then(|v| v.as_f64()), Some(72.0));
    assert_eq!(device.calls(), vec!["on 72"]);
}

#[tokio::test]
async fn test_shutdown_turns_off_and_stops() {
    let device = FakeOutput::default();
    let mut gadget = start(heater(device.clone()));
    gadget.next().await;

    gadget.command("turn on heater");
    gadget.next().await;
    gadget.command("shutdown");

    assert_eq!(gadget.next().await.value.as_bool(), Some(false));
    tokio_test::assert_ok!(gadget.handle.await);
}

#[tokio::test]
async fn test_unknown_unit_is_ignored() {
    let device = FakeOutput::default();
    let mut gadget = start(heater(device.clone()));
    gadget.next().await;

    gadget.command("turn on heater for 3 parsecs");
    gadget.command("turn on heater for many minutes");
    gadget.command("update");

    assert_eq!(gadget.next().await.value.as_bool(), Some(false));
    assert_eq!(device.calls(), vec!["off"]);
}

#[tokio::test]
async fn test_input_gadget_publishes_readings() {
    let (feed_tx, feed) = mpsc::channel(4);
    let (seen, mut forwarded) = mpsc::unbounded_channel();
    let device = FakeInput {
        initial: Value::number(18.0, "C"),
        feed,
        seen,
    };
    let mut gadget = start(Gadget::input("lab", "thermometer", Box::new(device)));

    let initial = gadget.next().await;
    assert_eq!(initial.sender, "lab thermometer");
    assert_eq!(initial.value.as_f64(), Some(18.0));
    assert_eq!(initial.value.units, "C");

    feed_tx.send(Value::number(19.5, "C")).await.unwrap();
    let reading = gadget.next().await;
    assert_eq!(reading.name, "thermometer");
    assert_eq!(reading.value.as_f64(), Some(19.5));

    // On/off commands are not for input gadgets; update re-publishes the last reading
    gadget.command("turn on lab thermometer");
    gadget.command("update");
    assert_eq!(gadget.next().await.value.as_f64(), Some(19.5));

    // Every bus message is also handed to the device
    assert_eq!(forwarded.recv().await.unwrap(), "turn on lab thermometer");
    assert_eq!(forwarded.recv().await.unwrap(), "update");

    gadget.command("shutdown");
    tokio_test::assert_ok!(gadget.handle.await);
}
