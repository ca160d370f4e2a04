//! Addressed message bus abstraction.
//!
//! Mirrors the point-to-point / publish-subscribe / request-reply model of the
//! scheduler's event bus:
//!
//! - `send` delivers to **one** handler at an address and returns a pending reply
//! - `publish` delivers to **every** handler at an address, no replies
//! - a [`Message`] can be replied to at most once; `reply` consumes it

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::core::GateError;

pub use memory::InMemoryBus;

/// Identifier of a local subscription, unique per bus.
pub type SubscriptionId = u64;

/// A message delivered to a subscriber.
#[derive(Debug)]
pub struct Message {
    address: String,
    body: Value,
    reply_to: Option<oneshot::Sender<Value>>,
}

impl Message {
    /// Create a message; `reply_to` is `None` for published messages.
    pub fn new(address: impl Into<String>, body: Value, reply_to: Option<oneshot::Sender<Value>>) -> Self {
        Self {
            address: address.into(),
            body,
            reply_to,
        }
    }

    /// Address the message was delivered to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Message payload.
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// True if the sender is waiting for a reply.
    pub const fn expects_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    /// Reply to the sender. Returns `false` if nobody is listening.
    pub fn reply(self, body: Value) -> bool {
        self.reply_to.is_some_and(|tx| tx.send(body).is_ok())
    }
}

/// Receiving end of a subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    address: String,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Subscription {
    /// Wrap a receiver as a subscription.
    pub fn new(id: SubscriptionId, address: impl Into<String>, rx: mpsc::UnboundedReceiver<Message>) -> Self {
        Self {
            id,
            address: address.into(),
            rx,
        }
    }

    /// Subscription identifier, used to unsubscribe.
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Subscribed address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Next message; `None` once the subscription has been released.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

/// Reply that has not arrived yet.
#[derive(Debug)]
pub struct PendingReply {
    address: String,
    rx: oneshot::Receiver<Value>,
}

impl PendingReply {
    /// Wrap a reply receiver.
    pub fn new(address: impl Into<String>, rx: oneshot::Receiver<Value>) -> Self {
        Self {
            address: address.into(),
            rx,
        }
    }

    /// Wait for the reply, up to `timeout`.
    pub async fn wait(self, timeout: Duration) -> Result<Value, GateError> {
        let Self { address, rx } = self;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(_)) => Err(GateError::ReplyDropped(address)),
            Err(_) => Err(GateError::ReplyTimeout { address, timeout }),
        }
    }
}

/// Addressed publish/subscribe and request/reply transport.
#[async_trait]
pub trait MessageBus: Send + Sync + 'static {
    /// Register a handler at `address`.
    fn subscribe(&self, address: &str) -> Subscription;

    /// Release a subscription. Returns `false` if it was unknown.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Deliver to every handler at `address`; returns how many were reached.
    fn publish(&self, address: &str, body: Value) -> usize;

    /// Deliver to one handler at `address` and return its pending reply.
    fn send(&self, address: &str, body: Value) -> Result<PendingReply, GateError>;

    /// Number of live handlers at `address`.
    fn handler_count(&self, address: &str) -> usize;

    /// `send` and wait for the reply.
    async fn request(&self, address: &str, body: Value, timeout: Duration) -> Result<Value, GateError> {
        self.send(address, body)?.wait(timeout).await
    }
}
