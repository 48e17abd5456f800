//! Robot Command Language (RCL)
//!
//! RCL is the small free-text grammar used in command bodies and method
//! steps:
//!
//! ```text
//! <command-prefix> [for|to <number> <unit>]
//! ```
//!
//! A command has one of two shapes: a plain prefix (`"turn on lab led"`) or a
//! prefix followed by an argument (`"turn on heater for 5 minutes"`,
//! `"set target to 72 F"`). The argument starts after the first `" for "`
//! marker, or failing that the first `" to "` marker.

use std::time::Duration;
use thiserror::Error;

use crate::units::{time_unit_seconds, unit_class, UnitClass};

const FOR_MARKER: &str = " for ";
const TO_MARKER: &str = " to ";

/// RCL parse errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RclError {
    #[error("command has no argument: {0}")]
    MissingArgument(String),

    #[error("invalid argument '{0}', expected '<number> <unit>'")]
    InvalidArgument(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("invalid operator: {0}")]
    UnknownOperator(String),
}

/// Result type for RCL parsing
pub type RclResult<T> = Result<T, RclError>;

/// Return the argument text of `cmd`, if it has the argument shape
pub fn split_argument(cmd: &str) -> Option<&str> {
    let cmd = cmd.trim();
    if let Some(i) = cmd.find(FOR_MARKER) {
        return Some(&cmd[i + FOR_MARKER.len()..]);
    }
    cmd.find(TO_MARKER).map(|i| &cmd[i + TO_MARKER.len()..])
}

/// The `<number> <unit>` argument of an RCL command
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub value: f64,
    pub unit: String,
}

impl Argument {
    /// Parse the argument of `cmd`
    ///
    /// Returns `Ok(None)` for a plain command without a `for`/`to` marker.
    pub fn from_command(cmd: &str) -> RclResult<Option<Self>> {
        split_argument(cmd).map(Self::parse).transpose()
    }

    /// Parse a bare `"<number> <unit>"` argument
    pub fn parse(text: &str) -> RclResult<Self> {
        let mut tokens = text.split_whitespace();
        let (number, unit) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(number), Some(unit), None) => (number, unit),
            _ => return Err(RclError::InvalidArgument(text.to_string())),
        };

        let value: f64 = number
            .parse()
            .map_err(|_| RclError::InvalidNumber(number.to_string()))?;
        if !value.is_finite() {
            return Err(RclError::InvalidNumber(number.to_string()));
        }

        Ok(Self {
            value,
            unit: unit.to_string(),
        })
    }

    /// The gadget class selected by the unit
    pub fn class(&self) -> RclResult<UnitClass> {
        unit_class(&self.unit).ok_or_else(|| RclError::UnknownUnit(self.unit.clone()))
    }

    /// Convert a time argument into a duration
    ///
    /// `None` for non-time units and negative values.
    pub fn duration(&self) -> Option<Duration> {
        let factor = time_unit_seconds(&self.unit)?;
        Duration::try_from_secs_f64(self.value * factor).ok()
    }
}

/// Parse the `<number> <unit>` argument of `cmd`
///
/// ```
/// let (value, unit) = gg_core::parse_command("turn on heater for 5 minutes").unwrap();
/// assert_eq!(value, 5.0);
/// assert_eq!(unit, "minutes");
/// ```
pub fn parse_command(cmd: &str) -> RclResult<(f64, String)> {
    match Argument::from_command(cmd)? {
        Some(arg) => Ok((arg.value, arg.unit)),
        None => Err(RclError::MissingArgument(cmd.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_for_argument() {
        assert_eq!(
            parse_command("turn on heater for 5 minutes"),
            Ok((5.0, "minutes".to_string()))
        );
    }

    #[test]
    fn test_parse_to_argument() {
        assert_eq!(parse_command("set target to 72 F"), Ok((72.0, "F".to_string())));
    }

    #[test]
    fn test_for_wins_over_to() {
        let arg = Argument::from_command("fill tank to top for 10 liters")
            .unwrap()
            .unwrap();
        assert_eq!(arg.value, 10.0);
        assert_eq!(arg.unit, "liters");
    }

    #[test]
    fn test_plain_command_has_no_argument() {
        assert_eq!(Argument::from_command("turn on lab led"), Ok(None));
        assert!(matches!(
            parse_command("turn on lab led"),
            Err(RclError::MissingArgument(_))
        ));
    }

    #[test]
    fn test_malformed_arguments() {
        assert!(matches!(
            parse_command("turn on heater for five minutes"),
            Err(RclError::InvalidNumber(n)) if n == "five"
        ));
        assert!(matches!(
            parse_command("turn on heater for 5"),
            Err(RclError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_command("turn on heater for 5 long minutes"),
            Err(RclError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_command("turn on heater for inf minutes"),
            Err(RclError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_fractional_durations() {
        let arg = Argument::parse("1.5 minutes").unwrap();
        assert_eq!(arg.duration(), Some(Duration::from_secs(90)));

        let arg = Argument::parse("0.5 hours").unwrap();
        assert_eq!(arg.duration(), Some(Duration::from_secs(1800)));

        let arg = Argument::parse("300 seconds").unwrap();
        assert_eq!(arg.duration(), Some(Duration::from_secs(300)));

        assert_eq!(Argument::parse("3 liters").unwrap().duration(), None);
        assert_eq!(Argument::parse("-3 seconds").unwrap().duration(), None);
    }

    #[test]
    fn test_argument_class() {
        assert_eq!(Argument::parse("10 gallons").unwrap().class(), Ok(UnitClass::Volume));
        assert_eq!(
            Argument::parse("10 parsecs").unwrap().class(),
            Err(RclError::UnknownUnit("parsecs".into()))
        );
    }
}
