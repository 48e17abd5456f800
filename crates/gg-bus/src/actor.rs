//! The contract every actor on the bus implements

use async_trait::async_trait;
use gg_core::{Direction, Message};
use tokio::sync::mpsc;
use tracing::debug;

/// Private inbound channel of an actor; the bus delivers every message here
pub type Inbox = mpsc::UnboundedReceiver<Message>;

/// Shared outbound channel; everything sent here is fanned out by the bus
pub type Outbox = mpsc::Sender<Message>;

/// An independently scheduled unit owning private state
///
/// Actors share no mutable state. All coordination happens by reading the
/// inbox and publishing to the outbox. The bus delivers an actor's own
/// messages back to it, so every actor filters out what is not meant for it.
#[async_trait]
pub trait Actor: Send {
    /// Stable identity, conventionally `"<location> <name>"`
    fn uid(&self) -> &str;

    /// Whether the actor reads from or writes to a device
    fn direction(&self) -> Direction;

    /// Run until a shutdown command is observed or the inbox closes
    async fn start(&mut self, inbox: Inbox, outbox: Outbox);
}

/// Publish `msg`, logging if the bus has gone away
pub async fn publish(outbox: &Outbox, msg: Message) {
    if let Err(e) = outbox.send(msg).await {
        debug!(uuid = %e.0.uuid, "Bus closed, dropping message");
    }
}
