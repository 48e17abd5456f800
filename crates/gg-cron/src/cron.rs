//! The Cron actor

use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike};
use gg_bus::{publish, Actor, Inbox, Outbox};
use gg_core::{commands, Direction, Message};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::jobs::{parse_jobs, CronResult, JobTable};
use crate::ticker::{SystemTicker, Ticker};

/// Identity of the scheduler on the bus
pub const UID: &str = "cron";

/// Default tick interval
pub const DEFAULT_SLEEP: Duration = Duration::from_secs(1);

/// Publishes the commands of every job due at the start of each minute
pub struct Cron {
    jobs: JobTable,
    ticker: Arc<dyn Ticker>,
    sleep: Duration,
    last_wake: Option<Instant>,
}

impl Cron {
    /// Create a scheduler from job lines
    pub fn new<S: AsRef<str>>(jobs: &[S]) -> CronResult<Self> {
        Ok(Self::from_table(parse_jobs(jobs)?))
    }

    /// Create a scheduler from an already built job table
    pub fn from_table(jobs: JobTable) -> Self {
        Self {
            jobs,
            ticker: Arc::new(SystemTicker),
            sleep: DEFAULT_SLEEP,
            last_wake: None,
        }
    }

    /// Replace the time source
    pub fn with_ticker(mut self, ticker: Arc<dyn Ticker>) -> Self {
        self.ticker = ticker;
        self
    }

    /// Set the tick interval
    pub fn with_sleep(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// The interval minus the time spent since the last wake
    fn next_sleep(&self) -> Duration {
        match self.last_wake {
            Some(last) => self.sleep.saturating_sub(last.elapsed()),
            None => self.sleep,
        }
    }

    async fn tick(&mut self, t: NaiveDateTime, outbox: &Outbox) {
        self.last_wake = Some(Instant::now());
        if t.second() != 0 {
            return;
        }

        let due: Vec<String> = self.jobs.due(t).into_iter().map(str::to_string).collect();
        trace!(time = %t, jobs = due.len(), "Checking jobs");
        for cmd in due {
            debug!(command = %cmd, "Firing job");
            publish(outbox, Message::command(UID, cmd)).await;
        }
    }
}

#[async_trait]
impl Actor for Cron {
    fn uid(&self) -> &str {
        UID
    }

    fn direction(&self) -> Direction {
        Direction::Na
    }

    async fn start(&mut self, mut inbox: Inbox, outbox: Outbox) {
        info!(keys = self.jobs.len(), "Cron starting");
        loop {
            let sleep = self.next_sleep();
            let ticker = Arc::clone(&self.ticker);
            tokio::select! {
                t = ticker.after(sleep) => self.tick(t, &outbox).await,
                msg = inbox.recv() => match msg {
                    Some(msg) if msg.is_command_body(commands::SHUTDOWN) => break,
                    Some(_) => {}
                    None => break,
                },
            }
        }
        debug!("Cron stopped");
    }
}
