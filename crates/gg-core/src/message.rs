//! Message types for the gadgets bus

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Value;

/// Kind of a bus message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Imperative instruction, the body is an RCL command
    Command,
    /// A device reporting its current or changed value
    Update,
    /// An ordered sequence of commands to run to completion
    Method,
}

impl MessageType {
    /// Get the message type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Command => "command",
            MessageType::Update => "update",
            MessageType::Method => "method",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an actor reads from or writes to the physical world
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
    /// Not a device (runner, cron)
    #[default]
    Na,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
            Direction::Na => "na",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auxiliary metadata advertised by the sender
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub direction: Direction,

    /// The on-command the sending gadget recognizes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub on: String,

    /// The off-command the sending gadget recognizes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub off: String,
}

/// The unit of communication on the bus
///
/// Messages carry no reply address. Correlation between a command and the
/// resulting update is by `sender`/`location`/`name` convention only; the
/// `uuid` is an opaque trace token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub uuid: Uuid,

    /// Message kind, `None` only for the empty termination signal
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageType>,

    /// Identity of the producing actor, conventionally `"<location> <name>"`
    #[serde(default)]
    pub sender: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub name: String,

    /// Free-text RCL command (COMMAND messages)
    #[serde(default)]
    pub body: String,

    /// Ordered command strings (METHOD messages)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<String>,

    #[serde(default)]
    pub value: Value,

    /// The commanded target, distinct from the measured value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<Value>,

    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub info: Info,
}

impl Message {
    fn new(kind: Option<MessageType>, sender: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            sender: sender.into(),
            location: String::new(),
            name: String::new(),
            body: String::new(),
            method: Vec::new(),
            value: Value::default(),
            target_value: None,
            timestamp: Utc::now(),
            info: Info::default(),
        }
    }

    /// Create a COMMAND message
    pub fn command(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::new(Some(MessageType::Command), sender)
        }
    }

    /// Create an UPDATE message reporting `value` for the device at `location`/`name`
    pub fn update(
        sender: impl Into<String>,
        location: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
            value,
            ..Self::new(Some(MessageType::Update), sender)
        }
    }

    /// Create a METHOD message; step order is preserved
    pub fn method(sender: impl Into<String>, steps: Vec<String>) -> Self {
        Self {
            method: steps,
            ..Self::new(Some(MessageType::Method), sender)
        }
    }

    /// Create the empty message published by an actor that terminated
    pub fn empty() -> Self {
        Self::new(None, "")
    }

    /// Attach the commanded target value
    pub fn with_target(mut self, target: Option<Value>) -> Self {
        self.target_value = target;
        self
    }

    /// Attach sender metadata
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    pub fn is_command(&self) -> bool {
        self.kind == Some(MessageType::Command)
    }

    pub fn is_update(&self) -> bool {
        self.kind == Some(MessageType::Update)
    }

    pub fn is_method(&self) -> bool {
        self.kind == Some(MessageType::Method)
    }

    /// True for the termination signal
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
    }

    /// True if this is a COMMAND whose body is exactly `body`
    pub fn is_command_body(&self, body: &str) -> bool {
        self.is_command() && self.body == body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reading;

    #[test]
    fn test_constructors_stamp_unique_ids() {
        let a = Message::command("cron", "turn on lab led");
        let b = Message::command("cron", "turn on lab led");

        assert_ne!(a.uuid, b.uuid);
        assert_eq!(a.uuid.get_version_num(), 4);
        assert!(a.is_command());
        assert!(a.is_command_body("turn on lab led"));
    }

    #[test]
    fn test_update_carries_identity() {
        let msg = Message::update("lab thermometer", "lab", "thermometer", Value::number(21.5, "C"));

        assert!(msg.is_update());
        assert_eq!(msg.location, "lab");
        assert_eq!(msg.name, "thermometer");
        assert_eq!(msg.value.as_f64(), Some(21.5));
    }

    #[test]
    fn test_method_preserves_order() {
        let steps = vec!["a".to_string(), "wait for 1 second".to_string(), "b".to_string()];
        let msg = Message::method("me", steps.clone());

        assert!(msg.is_method());
        assert_eq!(msg.method, steps);
    }

    #[test]
    fn test_empty_message() {
        let msg = Message::empty();
        assert!(msg.is_empty());
        assert!(!msg.is_command());
        assert!(msg.sender.is_empty());
    }

    #[test]
    fn test_wire_format() {
        let msg = Message::update("lab led", "lab", "led", Value::from(Reading::Bool(true)))
            .with_info(Info {
                direction: Direction::Output,
                on: "turn on lab led".into(),
                off: "turn off lab led".into(),
            });

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "update");
        assert_eq!(json["value"]["value"], true);
        assert_eq!(json["info"]["direction"], "output");

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
