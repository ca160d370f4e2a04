//! In-process stand-in for the scheduler side of the protocol.
//!
//! Serves the dispatcher address (`register`/`unregister`) and the control
//! address (`getQueue`, `getAllItems`, `scheduleBuild`), publishes lifecycle signals, and asks
//! the registered gate whether queue items may run. Used by integration tests
//! and local runs where no real scheduler is attached.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::config::GateConfig;
use crate::core::GateError;
use crate::infra::{MessageBus, SubscriptionId};
use crate::runtime::api::{
    AdmissionQuery, LifecycleSignal, QueueItem, StatusReply, TaskRef, ACTION_GET_ALL_ITEMS, ACTION_GET_QUEUE,
    ACTION_REGISTER, ACTION_SCHEDULE_BUILD, ACTION_UNREGISTER,
};
use crate::runtime::Spawn;
use crate::util::now_ms;

/// Reason used when a denying reply carries none.
pub const UNSPECIFIED_REASON: &str = "reason not specified";

/// Why a queue item may not start yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blockage {
    /// Short description reported by the gate.
    pub reason: String,
}

impl fmt::Display for Blockage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Scheduler simulator over any [`MessageBus`].
pub struct SchedulerSimulator<B, S> {
    bus: B,
    spawner: S,
    config: GateConfig,
    registered_handler: Mutex<Option<String>>,
    queue: Mutex<Vec<QueueItem>>,
    projects: Mutex<BTreeSet<String>>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    next_item_id: AtomicU64,
}

impl<B, S> SchedulerSimulator<B, S>
where
    B: MessageBus,
    S: Spawn,
{
    /// Create a stopped simulator.
    pub fn new(bus: B, config: GateConfig, spawner: S) -> Self {
        Self {
            bus,
            spawner,
            config,
            registered_handler: Mutex::new(None),
            queue: Mutex::new(Vec::new()),
            projects: Mutex::new(BTreeSet::new()),
            subscriptions: Mutex::new(Vec::new()),
            next_item_id: AtomicU64::new(1),
        }
    }

    /// Serve the control and dispatcher addresses and publish `started`.
    pub fn start(self: &Arc<Self>) {
        {
            let mut subs = self.subscriptions.lock();
            if !subs.is_empty() {
                tracing::warn!("scheduler already started");
                return;
            }

            let mut control = self.bus.subscribe(&self.config.control_address);
            let mut dispatcher = self.bus.subscribe(&self.config.dispatcher_address);
            subs.push(control.id());
            subs.push(dispatcher.id());

            let me = Arc::clone(self);
            self.spawner.spawn(async move {
                while let Some(msg) = control.recv().await {
                    let reply = me.handle_control(msg.body());
                    msg.reply(reply);
                }
            });

            let me = Arc::clone(self);
            self.spawner.spawn(async move {
                while let Some(msg) = dispatcher.recv().await {
                    let reply = me.handle_dispatcher(msg.body());
                    msg.reply(reply);
                }
            });
        }

        let reached = self
            .bus
            .publish(&self.config.lifecycle_address, LifecycleSignal::Started.into_value());
        tracing::info!(reached, "scheduler started");
    }

    /// Publish `stopped` and stop serving.
    pub fn stop(&self) {
        let reached = self
            .bus
            .publish(&self.config.lifecycle_address, LifecycleSignal::Stopped.into_value());
        let subs: Vec<SubscriptionId> = self.subscriptions.lock().drain(..).collect();
        for id in subs {
            self.bus.unsubscribe(id);
        }
        tracing::info!(reached, "scheduler stopped");
    }

    /// Address of the currently registered gate handler.
    pub fn registered_handler(&self) -> Option<String> {
        self.registered_handler.lock().clone()
    }

    /// Items waiting in the simulated queue.
    pub fn queued_items(&self) -> Vec<QueueItem> {
        self.queue.lock().clone()
    }

    /// Make a job known to the scheduler.
    pub fn add_project(&self, name: impl Into<String>) {
        self.projects.lock().insert(name.into());
    }

    /// Names of known jobs, sorted.
    pub fn projects(&self) -> Vec<String> {
        self.projects.lock().iter().cloned().collect()
    }

    /// Add an item to the simulated queue, assigning an id if it has none.
    pub fn enqueue(&self, mut item: QueueItem) -> QueueItem {
        if item.id.is_none() {
            item.id = Some(self.next_item_id.fetch_add(1, Ordering::Relaxed));
        }
        if item.in_queue_since.is_none() {
            item.in_queue_since = Some(now_ms());
        }
        self.queue.lock().push(item.clone());
        item
    }

    /// Ask the registered gate whether `item` may start.
    ///
    /// Returns `None` (may run) when no gate is registered, when the gate does
    /// not answer in time, or when its reply does not deny explicitly.
    pub async fn can_run(&self, item: &QueueItem) -> Option<Blockage> {
        let Some(handler) = self.registered_handler() else {
            tracing::debug!("no handler registered");
            return None;
        };

        let query = AdmissionQuery::can_run(item.clone()).into_value();
        match self.bus.request(&handler, query, self.config.reply_timeout()).await {
            Ok(reply) => {
                if reply.get("canRun").and_then(Value::as_bool).unwrap_or(true) {
                    None
                } else {
                    let reason = reply
                        .get("reason")
                        .and_then(Value::as_str)
                        .unwrap_or(UNSPECIFIED_REASON);
                    Some(Blockage {
                        reason: reason.to_owned(),
                    })
                }
            }
            Err(GateError::ReplyTimeout { .. }) => {
                tracing::warn!(handler = %handler, "timeout waiting for reply");
                None
            }
            Err(e) => {
                tracing::error!(handler = %handler, "unable to send canRun query: {e}");
                None
            }
        }
    }

    /// Handle a dispatcher command and build its reply.
    pub fn handle_dispatcher(&self, body: &Value) -> Value {
        let Some(action) = body.get("action").and_then(Value::as_str) else {
            return error_reply("no action provided");
        };
        let handler = body.get("handlerAddress").and_then(Value::as_str);

        match action {
            ACTION_REGISTER => {
                let Some(handler) = handler else {
                    return error_reply("missing handlerAddress");
                };
                let mut registered = self.registered_handler.lock();
                if let Some(existing) = registered.as_deref() {
                    tracing::warn!("replacing existing handler {existing} with {handler}");
                }
                *registered = Some(handler.to_owned());
                StatusReply::ok().into_value()
            }
            ACTION_UNREGISTER => {
                let Some(handler) = handler else {
                    return error_reply("missing handlerAddress");
                };
                let mut registered = self.registered_handler.lock();
                if registered.as_deref() == Some(handler) {
                    *registered = None;
                    StatusReply::ok().into_value()
                } else {
                    error_reply("handler ID mismatch")
                }
            }
            other => error_reply(&format!("unknown action {other}")),
        }
    }

    /// Handle a control request and build its reply.
    pub fn handle_control(&self, body: &Value) -> Value {
        let Some(action) = body.get("action").and_then(Value::as_str) else {
            return error_reply("no action provided");
        };

        match action {
            ACTION_GET_QUEUE => {
                let items = serde_json::to_value(self.queued_items()).unwrap_or_else(|_| json!([]));
                StatusReply::ok_with(json!({ "items": items })).into_value()
            }
            ACTION_GET_ALL_ITEMS => {
                let items: Vec<Value> = self
                    .projects()
                    .into_iter()
                    .map(|name| json!({ "name": name }))
                    .collect();
                StatusReply::ok_with(json!({ "items": items })).into_value()
            }
            ACTION_SCHEDULE_BUILD => {
                let Some(data) = body.get("data") else {
                    return error_reply("missing job data");
                };
                let Some(project) = data.get("projectName").and_then(Value::as_str) else {
                    return error_reply("no such project");
                };
                self.add_project(project);
                let params = data.get("params").map(Value::to_string);
                let item = self.enqueue(QueueItem {
                    task: Some(TaskRef::named(project)),
                    buildable: Some(true),
                    params,
                    ..QueueItem::default()
                });
                tracing::info!(project, id = item.id, "build scheduled");
                StatusReply::ok().into_value()
            }
            other => error_reply(&format!("unknown action {other}")),
        }
    }
}

fn error_reply(message: &str) -> Value {
    tracing::error!("{message}");
    StatusReply::error(message).into_value()
}
