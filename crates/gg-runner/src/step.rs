//! Method steps
//!
//! A method is a list of RCL commands. Steps whose first word is `wait` are
//! waits, in one of two forms:
//!
//! ```text
//! wait for <number> (second|seconds|minute|minutes|hour|hours)
//! wait for <sender-uid> (>=|>|==|<=|<) <number>
//! ```
//!
//! Every other step is published as a command.

use gg_core::{time_unit_seconds, Comparison, Message, RclError};
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

static TIME_WAIT: OnceLock<Regex> = OnceLock::new();
static CONDITION_WAIT: OnceLock<Regex> = OnceLock::new();

fn time_wait() -> &'static Regex {
    TIME_WAIT.get_or_init(|| {
        Regex::new(r"^wait for (\d*\.?\d+) (seconds?|minutes?|hours?)$").expect("valid time wait pattern")
    })
}

fn condition_wait() -> &'static Regex {
    CONDITION_WAIT.get_or_init(|| {
        Regex::new(r"^wait for (.+) (\S+) (-?\d*\.?\d+)$").expect("valid condition wait pattern")
    })
}

/// Method step errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error("unrecognized wait step: {0}")]
    InvalidWait(String),

    #[error("invalid number '{value}' in step '{step}'")]
    InvalidNumber { step: String, value: String },

    #[error("invalid step '{step}': {source}")]
    Rcl {
        step: String,
        #[source]
        source: RclError,
    },
}

/// Result type for step parsing
pub type StepResult<T> = Result<T, StepError>;

/// Predicate a condition wait applies to every update
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Uid of the actor whose update is awaited
    pub sender: String,
    pub operator: Comparison,
    pub threshold: f64,
}

impl Condition {
    /// True for a numeric update from `sender` satisfying the comparison
    pub fn matches(&self, msg: &Message) -> bool {
        msg.is_update()
            && msg.sender == self.sender
            && msg
                .value
                .as_f64()
                .is_some_and(|v| self.operator.apply(v, self.threshold))
    }
}

/// One step of a method
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Publish the text as a COMMAND
    Command(String),
    /// Suspend for a fixed time
    WaitFor(Duration),
    /// Suspend until a matching update arrives
    WaitUntil(Condition),
}

impl Step {
    /// Parse a single step
    pub fn parse(text: &str) -> StepResult<Self> {
        let text = text.trim();
        if text.split_whitespace().next() != Some("wait") {
            return Ok(Step::Command(text.to_string()));
        }

        if let Some(caps) = time_wait().captures(text) {
            let number = number(text, &caps[1])?;
            let factor = time_unit_seconds(&caps[2]).unwrap_or(1.0);
            let duration = Duration::try_from_secs_f64(number * factor).map_err(|_| {
                StepError::InvalidNumber {
                    step: text.to_string(),
                    value: caps[1].to_string(),
                }
            })?;
            return Ok(Step::WaitFor(duration));
        }

        if let Some(caps) = condition_wait().captures(text) {
            let operator = Comparison::from_str(&caps[2]).map_err(|source| StepError::Rcl {
                step: text.to_string(),
                source,
            })?;
            return Ok(Step::WaitUntil(Condition {
                sender: caps[1].to_string(),
                operator,
                threshold: number(text, &caps[3])?,
            }));
        }

        Err(StepError::InvalidWait(text.to_string()))
    }

    pub fn is_wait(&self) -> bool {
        !matches!(self, Step::Command(_))
    }
}

impl FromStr for Step {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::parse(s)
    }
}

fn number(step: &str, text: &str) -> StepResult<f64> {
    text.parse().map_err(|_| StepError::InvalidNumber {
        step: step.to_string(),
        value: text.to_string(),
    })
}

/// Parse every step of a method, failing on the first invalid one
pub fn parse_method<S: AsRef<str>>(steps: &[S]) -> StepResult<Vec<Step>> {
    steps.iter().map(|s| Step::parse(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gg_core::Value;

    #[test]
    fn test_commands_pass_through() {
        assert_eq!(
            Step::parse("turn on pump"),
            Ok(Step::Command("turn on pump".into()))
        );
        // Only the word "wait" starts a wait
        assert_eq!(
            Step::parse("waiting room light on"),
            Ok(Step::Command("waiting room light on".into()))
        );
    }

    #[test]
    fn test_time_waits() {
        assert_eq!(
            Step::parse("wait for 2 minutes"),
            Ok(Step::WaitFor(Duration::from_secs(120)))
        );
        assert_eq!(
            Step::parse("wait for 1 hour"),
            Ok(Step::WaitFor(Duration::from_secs(3600)))
        );
        assert_eq!(
            Step::parse("wait for 0.5 seconds"),
            Ok(Step::WaitFor(Duration::from_millis(500)))
        );
    }

    #[test]
    fn test_condition_waits() {
        let step = Step::parse("wait for lab thermometer >= 100").unwrap();
        let Step::WaitUntil(condition) = step else {
            panic!("expected a condition wait");
        };
        assert_eq!(condition.sender, "lab thermometer");
        assert_eq!(condition.operator, Comparison::Ge);
        assert_eq!(condition.threshold, 100.0);

        let step = Step::parse("wait for tank volume < -1.5").unwrap();
        assert!(matches!(step, Step::WaitUntil(c) if c.operator == Comparison::Lt && c.threshold == -1.5));
    }

    #[test]
    fn test_invalid_waits() {
        assert!(matches!(
            Step::parse("wait for lab thermometer => 100"),
            Err(StepError::Rcl { source: RclError::UnknownOperator(op), .. }) if op == "=>"
        ));
        assert!(matches!(Step::parse("wait"), Err(StepError::InvalidWait(_))));
        assert!(matches!(
            Step::parse("wait for the kettle"),
            Err(StepError::InvalidWait(_))
        ));
    }

    #[test]
    fn test_parse_method_fails_whole() {
        let steps = ["turn on pump", "wait for 2 minutes", "turn off pump"];
        let parsed = parse_method(&steps).unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(parsed[1].is_wait());

        assert!(parse_method(&["turn on pump", "wait for ever"]).is_err());
    }

    #[test]
    fn test_condition_matches_updates_only() {
        let condition = Condition {
            sender: "lab thermometer".into(),
            operator: Comparison::Ge,
            threshold: 100.0,
        };

        let hot = Message::update("lab thermometer", "lab", "thermometer", Value::number(101.0, "C"));
        let cold = Message::update("lab thermometer", "lab", "thermometer", Value::number(99.0, "C"));
        let other = Message::update("attic thermometer", "attic", "thermometer", Value::number(120.0, "C"));
        let command = Message::command("lab thermometer", "update");

        assert!(condition.matches(&hot));
        assert!(!condition.matches(&cold));
        assert!(!condition.matches(&other));
        assert!(!condition.matches(&command));
    }
}
