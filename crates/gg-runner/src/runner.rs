//! The Runner actor
//!
//! Executes one method at a time. Command steps are published back to
//! back; a wait step suspends the method until its timer fires or a
//! matching update arrives. A new method preempts the running one.

use async_trait::async_trait;
use gg_bus::{publish, Actor, Inbox, Outbox, Timer};
use gg_core::{commands, Direction, Message};
use tracing::{debug, info, warn};

use crate::step::{parse_method, Condition, Step};

/// Default uid of the runner
pub const DEFAULT_UID: &str = "runner";

/// Where the runner is in its current method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// No method loaded
    Idle,
    /// Method loaded, no wait pending
    Running,
    WaitingOnTimer,
    WaitingOnCondition,
}

/// Sequential executor for METHOD messages
pub struct Runner {
    uid: String,
    steps: Vec<Step>,
    /// Index of the next step to run
    next: usize,
    timer: Timer,
    condition: Option<Condition>,
}

impl Runner {
    /// Create a new runner
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            steps: Vec::new(),
            next: 0,
            timer: Timer::new(),
            condition: None,
        }
    }

    pub fn state(&self) -> RunnerState {
        if self.steps.is_empty() {
            RunnerState::Idle
        } else if self.timer.is_armed() {
            RunnerState::WaitingOnTimer
        } else if self.condition.is_some() {
            RunnerState::WaitingOnCondition
        } else {
            RunnerState::Running
        }
    }

    pub(crate) async fn read_message(&mut self, msg: &Message, outbox: &Outbox) {
        if msg.is_method() {
            self.load(&msg.method, outbox).await;
        } else if msg.is_update() && self.condition_met(msg) {
            debug!(uid = %self.uid, sender = %msg.sender, "Wait condition met");
            self.condition = None;
            self.advance(outbox).await;
        }
    }

    fn condition_met(&self, msg: &Message) -> bool {
        !self.steps.is_empty() && self.condition.as_ref().is_some_and(|c| c.matches(msg))
    }

    /// Replace the current method, rejecting it whole if any step is invalid
    async fn load(&mut self, method: &[String], outbox: &Outbox) {
        let steps = match parse_method(method) {
            Ok(steps) => steps,
            Err(e) => {
                warn!(uid = %self.uid, error = %e, "Rejecting method");
                return;
            }
        };

        if !self.steps.is_empty() {
            info!(uid = %self.uid, step = self.next, "Preempting running method");
        }
        self.timer.cancel();
        self.condition = None;
        self.steps = steps;
        self.next = 0;
        debug!(uid = %self.uid, steps = self.steps.len(), "Method loaded");

        self.advance(outbox).await;
    }

    /// Run steps until a wait suspends the method or it completes
    pub(crate) async fn advance(&mut self, outbox: &Outbox) {
        while let Some(step) = self.steps.get(self.next).cloned() {
            self.next += 1;
            match step {
                Step::Command(cmd) => {
                    debug!(uid = %self.uid, command = %cmd, "Running step");
                    let msg = Message::command(self.uid.clone(), cmd);
                    publish(outbox, msg).await;
                }
                Step::WaitFor(duration) => {
                    debug!(uid = %self.uid, ?duration, "Waiting");
                    self.timer.arm(duration);
                    return;
                }
                Step::WaitUntil(condition) => {
                    debug!(
                        uid = %self.uid,
                        sender = %condition.sender,
                        operator = %condition.operator,
                        threshold = condition.threshold,
                        "Waiting for update"
                    );
                    self.condition = Some(condition);
                    return;
                }
            }
        }

        debug!(uid = %self.uid, "Method complete");
        self.steps.clear();
        self.next = 0;
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(DEFAULT_UID)
    }
}

#[async_trait]
impl Actor for Runner {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn direction(&self) -> Direction {
        Direction::Na
    }

    async fn start(&mut self, mut inbox: Inbox, outbox: Outbox) {
        debug!(uid = %self.uid, "Runner starting");
        loop {
            tokio::select! {
                msg = inbox.recv() => match msg {
                    Some(msg) if msg.is_command_body(commands::SHUTDOWN) => break,
                    Some(msg) => self.read_message(&msg, &outbox).await,
                    None => break,
                },
                _ = self.timer.expired() => self.advance(&outbox).await,
            }
        }

        self.timer.cancel();
        self.condition = None;
        publish(&outbox, Message::empty()).await;
        debug!(uid = %self.uid, "Runner stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gg_core::Value;
    use tokio::sync::mpsc;

    fn method(steps: &[&str]) -> Message {
        Message::method("tester", steps.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions() {
        let (outbox, mut published) = mpsc::channel(16);
        let mut runner = Runner::default();
        assert_eq!(runner.state(), RunnerState::Idle);

        runner
            .read_message(
                &method(&["turn on pump", "wait for 2 minutes", "wait for tank volume >= 10", "turn off pump"]),
                &outbox,
            )
            .await;
        assert_eq!(published.recv().await.unwrap().body, "turn on pump");
        assert_eq!(runner.state(), RunnerState::WaitingOnTimer);

        runner.timer.expired().await;
        runner.advance(&outbox).await;
        assert_eq!(runner.state(), RunnerState::WaitingOnCondition);

        let low = Message::update("tank volume", "tank", "volume", Value::number(4.0, "liters"));
        runner.read_message(&low, &outbox).await;
        assert_eq!(runner.state(), RunnerState::WaitingOnCondition);

        let full = Message::update("tank volume", "tank", "volume", Value::number(10.0, "liters"));
        runner.read_message(&full, &outbox).await;
        assert_eq!(published.recv().await.unwrap().body, "turn off pump");
        assert_eq!(runner.state(), RunnerState::Idle);
    }

    #[tokio::test]
    async fn test_commands_carry_runner_uid() {
        let (outbox, mut published) = mpsc::channel(16);
        let mut runner = Runner::new("kitchen runner");

        runner.read_message(&method(&["a", "b"]), &outbox).await;
        let a = published.recv().await.unwrap();
        let b = published.recv().await.unwrap();
        assert_eq!((a.sender.as_str(), a.body.as_str()), ("kitchen runner", "a"));
        assert_eq!((b.sender.as_str(), b.body.as_str()), ("kitchen runner", "b"));
        assert_eq!(runner.state(), RunnerState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_method_leaves_running_method() {
        let (outbox, _published) = mpsc::channel(16);
        let mut runner = Runner::default();

        runner.read_message(&method(&["wait for lab thermometer > 50", "x"]), &outbox).await;
        runner.read_message(&method(&["y", "wait for lab thermometer => 50"]), &outbox).await;

        assert_eq!(runner.state(), RunnerState::WaitingOnCondition);
        assert_eq!(runner.steps.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_method_is_idle() {
        let (outbox, _published) = mpsc::channel(16);
        let mut runner = Runner::default();

        runner.read_message(&method(&[]), &outbox).await;
        assert_eq!(runner.state(), RunnerState::Idle);
    }
}
