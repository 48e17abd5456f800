//! Gadget actor for gadgets
//!
//! This crate provides the [`Gadget`] actor, the [`OutputDevice`] and
//! [`InputDevice`] capabilities it drives, and the built-in devices in
//! [`devices`].

mod device;
pub mod devices;
mod gadget;

pub use device::{DeviceError, DeviceResult, InputDevice, OutputDevice};
pub use gadget::{Gadget, GadgetBuilder, Status};
