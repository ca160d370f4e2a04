//! In-process message bus backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::{Message, MessageBus, PendingReply, Subscription, SubscriptionId};
use crate::core::GateError;

#[derive(Debug)]
struct Handler {
    id: SubscriptionId,
    tx: mpsc::UnboundedSender<Message>,
}

#[derive(Debug, Default)]
struct Inner {
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
    next_id: AtomicU64,
    cursor: AtomicUsize,
}

/// In-memory bus for tests and single-process deployments.
///
/// Each subscription owns an unbounded `tokio::sync::mpsc` queue. `send`
/// round-robins across live handlers at an address. Handlers whose receiver
/// was dropped without `unsubscribe` are pruned on the next `subscribe` or
/// `send`. Cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

impl InMemoryBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses that currently have at least one handler, sorted.
    pub fn addresses(&self) -> Vec<String> {
        let handlers = self.inner.handlers.read();
        let mut addrs: Vec<String> = handlers
            .iter()
            .filter(|(_, hs)| hs.iter().any(|h| !h.tx.is_closed()))
            .map(|(addr, _)| addr.clone())
            .collect();
        addrs.sort_unstable();
        addrs
    }
}

impl MessageBus for InMemoryBus {
    fn subscribe(&self, address: &str) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        let mut handlers = self.inner.handlers.write();
        handlers.retain(|_, hs| {
            hs.retain(|h| !h.tx.is_closed());
            !hs.is_empty()
        });
        handlers.entry(address.to_owned()).or_default().push(Handler { id, tx });
        drop(handlers);
        tracing::debug!(address, id, "subscribed");
        Subscription::new(id, address, rx)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.inner.handlers.write();
        let Some(address) = handlers
            .iter()
            .find(|(_, hs)| hs.iter().any(|h| h.id == id))
            .map(|(addr, _)| addr.clone())
        else {
            return false;
        };

        if let Some(hs) = handlers.get_mut(&address) {
            hs.retain(|h| h.id != id);
            if hs.is_empty() {
                handlers.remove(&address);
            }
        }
        tracing::debug!(address = %address, id, "unsubscribed");
        true
    }

    fn publish(&self, address: &str, body: Value) -> usize {
        let handlers = self.inner.handlers.read();
        handlers.get(address).map_or(0, |hs| {
            hs.iter()
                .filter(|h| h.tx.send(Message::new(address, body.clone(), None)).is_ok())
                .count()
        })
    }

    fn send(&self, address: &str, body: Value) -> Result<PendingReply, GateError> {
        let mut handlers = self.inner.handlers.write();
        let Some(live) = handlers.get_mut(address) else {
            return Err(GateError::NoHandlers(address.to_owned()));
        };
        live.retain(|h| !h.tx.is_closed());
        if live.is_empty() {
            handlers.remove(address);
            return Err(GateError::NoHandlers(address.to_owned()));
        }

        let pick = self.inner.cursor.fetch_add(1, Ordering::Relaxed) % live.len();
        let (reply_tx, reply_rx) = oneshot::channel();
        live[pick]
            .tx
            .send(Message::new(address, body, Some(reply_tx)))
            .map_err(|_| GateError::NoHandlers(address.to_owned()))?;

        Ok(PendingReply::new(address, reply_rx))
    }

    fn handler_count(&self, address: &str) -> usize {
        self.inner
            .handlers
            .read()
            .get(address)
            .map_or(0, |hs| hs.iter().filter(|h| !h.tx.is_closed()).count())
    }
}
