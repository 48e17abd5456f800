//! Single-slot cancellable timer owned by an actor

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep, Instant, Sleep};
use tracing::trace;

/// A one-shot deadline that an actor polls from its `select!` loop
///
/// At most one deadline is armed at a time. Arming replaces the previous
/// deadline, which is therefore cancelled before the new one exists. A
/// deadline fires at most once.
#[derive(Debug, Default)]
pub struct Timer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Timer {
    /// Create a disarmed timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire after `duration`, cancelling any armed deadline
    pub fn arm(&mut self, duration: Duration) {
        if self.sleep.is_some() {
            trace!("Re-arming timer, previous deadline cancelled");
        }
        self.sleep = Some(Box::pin(sleep(duration)));
    }

    /// Cancel the armed deadline; returns whether one was armed
    pub fn cancel(&mut self) -> bool {
        self.sleep.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// When the armed deadline will fire
    pub fn deadline(&self) -> Option<Instant> {
        self.sleep.as_ref().map(|s| s.deadline())
    }

    /// Wait for the armed deadline
    ///
    /// Pending forever while disarmed. Dropping the returned future before it
    /// completes leaves the deadline armed, so this is safe to use as a
    /// `tokio::select!` branch.
    pub async fn expired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => pending::<()>().await,
        }
    }
}
