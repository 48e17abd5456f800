//! Method runner for gadgets
//!
//! A method is an ordered list of RCL commands sent as a METHOD message,
//! for example:
//!
//! ```text
//! turn on pump
//! wait for 2 minutes
//! turn off pump
//! ```
//!
//! The [`Runner`] publishes each command in turn and honours the `wait`
//! steps in between. See [`step`] for the step grammar.

mod runner;
pub mod step;

pub use runner::{Runner, RunnerState, DEFAULT_UID};
pub use step::{parse_method, Condition, Step, StepError, StepResult};
