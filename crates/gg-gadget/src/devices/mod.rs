//! Built-in devices
//!
//! Electrical protocols are not implemented here. [`LogDriver`] stands in
//! for a pin; [`Heater`] and [`Thermostat`] are control loops that drive any
//! inner [`OutputDevice`](crate::OutputDevice), and [`Switch`] turns the edges
//! of a [`Poller`] into readings.

mod heater;
mod log;
mod switch;
mod thermostat;

pub use heater::Heater;
pub use log::LogDriver;
pub use switch::{Poller, Switch};
pub use thermostat::{Thermostat, ThermostatMode};
