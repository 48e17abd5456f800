//! Message bus for gadgets
//!
//! This crate provides the [`Bus`], the fan-out that connects every actor in
//! the system, together with the [`Actor`] contract and the single-slot
//! [`Timer`] actors use for their timed waits.
//!
//! Every message published to the shared outbox is delivered to every
//! subscribed actor's inbox, including the actor that published it.

mod actor;
mod timer;

pub use actor::{publish, Actor, Inbox, Outbox};
pub use timer::Timer;

use dashmap::DashMap;
use gg_core::Message;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

/// Default capacity of the shared outbox
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// The fan-out connecting every actor
///
/// The Bus supports:
/// - Subscribing an actor by uid (one inbox per uid)
/// - Handing out clones of the shared outbox
/// - Dispatching a message to every subscriber
pub struct Bus {
    /// Inbox senders keyed by actor uid
    subscribers: DashMap<String, mpsc::UnboundedSender<Message>>,
    /// Shared outbox handed to actors
    outbox: Outbox,
    /// Receiving end of the shared outbox, drained by `run`
    published: Mutex<mpsc::Receiver<Message>>,
}

impl Bus {
    /// Create a new bus
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with the given outbox capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (outbox, published) = mpsc::channel(capacity.max(1));
        Self {
            subscribers: DashMap::new(),
            outbox,
            published: Mutex::new(published),
        }
    }

    /// Subscribe an actor; re-subscribing a uid replaces its inbox
    pub fn subscribe(&self, uid: impl Into<String>) -> Inbox {
        let uid = uid.into();
        trace!(uid = %uid, "Subscribing to bus");
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(uid, tx);
        rx
    }

    /// Remove an actor's inbox
    pub fn unsubscribe(&self, uid: &str) -> bool {
        self.subscribers.remove(uid).is_some()
    }

    /// A handle for publishing onto the bus
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Get the number of subscribed actors
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver a message to every subscriber
    ///
    /// Subscribers whose inbox has been dropped are pruned.
    pub fn dispatch(&self, msg: &Message) {
        trace!(uuid = %msg.uuid, sender = %msg.sender, "Dispatching message");

        self.subscribers.retain(|uid, inbox| {
            if inbox.send(msg.clone()).is_ok() {
                true
            } else {
                debug!(uid = %uid, "Inbox closed, removing subscriber");
                false
            }
        });
    }

    /// Drain the shared outbox and fan out every message
    ///
    /// Runs until every outbox handle, including the bus's own, is dropped.
    pub async fn run(&self) {
        let mut published = self.published.lock().await;
        info!(subscribers = self.subscriber_count(), "Bus running");

        while let Some(msg) = published.recv().await {
            self.dispatch(&msg);
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscribe `actor` under its uid and run it on the tokio runtime
pub fn spawn(mut actor: Box<dyn Actor>, bus: &Bus) -> JoinHandle<()> {
    let inbox = bus.subscribe(actor.uid());
    let outbox = bus.outbox();
    debug!(uid = %actor.uid(), direction = %actor.direction(), "Spawning actor");
    tokio::spawn(async move {
        actor.start(inbox, outbox).await;
        debug!(uid = %actor.uid(), "Actor stopped");
    })
}
