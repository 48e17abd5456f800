//! Core types for gadgets
//!
//! This crate provides the fundamental types shared by every actor in the
//! system: the [`Message`] exchanged on the bus, the [`Value`] it carries,
//! the unit table and the Robot Command Language (RCL) parser used to read
//! free-text commands such as `"turn on heater for 5 minutes"`.

mod comparison;
mod message;
pub mod rcl;
mod units;
mod value;

pub use comparison::Comparison;
pub use message::{Direction, Info, Message, MessageType};
pub use rcl::{parse_command, Argument, RclError, RclResult};
pub use units::{time_unit_seconds, unit_class, UnitClass};
pub use value::{Reading, Value};

/// Well-known command bodies every actor understands
pub mod commands {
    /// Ask a gadget to re-publish its current status
    pub const UPDATE: &str = "update";

    /// Stop an actor after processing the current message
    pub const SHUTDOWN: &str = "shutdown";
}
