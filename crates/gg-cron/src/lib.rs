//! Cron scheduler for gadgets
//!
//! The [`Cron`] actor holds a table of calendar-triggered jobs and, at the
//! start of every minute, publishes the commands of every job that matches
//! the current time:
//!
//! ```text
//! # minute hour day month weekday command
//! 0 7 * * 1-5 turn on kitchen radio
//! 30 22 * * * turn off living room lamp
//! ```

mod cron;
pub mod jobs;
mod ticker;

pub use cron::{Cron, DEFAULT_SLEEP, UID};
pub use jobs::{
    expand_field, expand_fields, parse_jobs, possibilities, CronError, CronKey, CronResult,
    JobTable, Slot,
};
pub use ticker::{SystemTicker, Ticker};
