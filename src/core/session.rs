//! Registration handshake between the gate and the scheduler's dispatcher.
//!
//! ```text
//! start() ──► subscribe lifecycle ──► probe control ("getQueue")
//!                 │                          │ any reply
//!                 │ "started" ─────────────► register()
//!                 │                          ├─► subscribe gate at handler address
//!                 │                          └─► send {register, handlerAddress}
//!                 │ "stopped" ─────────────► unregister()
//!                 │                          ├─► send {unregister, handlerAddress}
//!                 │                          └─► release gate subscription
//! shutdown() ──► unregister() + release lifecycle listener
//! ```
//!
//! `shutdown()` is final: a probe reply or a queued `started` signal that
//! arrives afterwards is ignored, and `start()`/`register()` refuse.
//!
//! Outbound commands are fire-and-forget: acknowledgments are awaited on a
//! spawned task and only logged. Local state is never rolled back on transport
//! failure; the next lifecycle signal resynchronizes it.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::config::GateConfig;
use crate::core::AdmissionGate;
use crate::infra::{MessageBus, SubscriptionId};
use crate::runtime::api::{queue_probe, LifecycleSignal, RegistrationCommand};
use crate::runtime::Spawn;
use crate::util::handler_address;

/// An active registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    /// Gate instance identifier, fixed for the process lifetime.
    pub instance_id: Uuid,
    /// Address the scheduler sends queries to.
    pub handler_address: String,
    /// Subscriptions opened by this registration.
    pub subscriptions: Vec<SubscriptionId>,
}

#[derive(Debug, Default)]
struct SessionState {
    registration: Option<RegistrationRecord>,
    lifecycle: Option<SubscriptionId>,
    shut_down: bool,
}

/// Announces the gate's address to the scheduler and withdraws it.
///
/// At most one registration is active at a time; duplicate `register()` calls
/// (for example a repeated `started` signal) are ignored.
pub struct RegistrationSession<B, S> {
    config: GateConfig,
    gate: Arc<AdmissionGate>,
    bus: B,
    spawner: S,
    instance_id: Uuid,
    handler_address: String,
    state: Mutex<SessionState>,
}

impl<B, S> RegistrationSession<B, S>
where
    B: MessageBus,
    S: Spawn,
{
    /// Create a session. The instance id and handler address are generated
    /// here, once.
    pub fn new(config: GateConfig, gate: AdmissionGate, bus: B, spawner: S) -> Self {
        let instance_id = Uuid::new_v4();
        let handler_address = handler_address(&config.address_prefix, instance_id);
        Self {
            config,
            gate: Arc::new(gate),
            bus,
            spawner,
            instance_id,
            handler_address,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Gate instance identifier.
    pub const fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Address the gate answers queries on.
    pub fn handler_address(&self) -> &str {
        &self.handler_address
    }

    /// The gate served by this session.
    pub const fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    /// True once `shutdown()` has run.
    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shut_down
    }

    /// True while a registration is active.
    pub fn is_registered(&self) -> bool {
        self.state.lock().registration.is_some()
    }

    /// Snapshot of the active registration.
    pub fn record(&self) -> Option<RegistrationRecord> {
        self.state.lock().registration.clone()
    }

    /// Subscribe the gate at its address and send a `register` command.
    ///
    /// Returns `false` without side effects if already registered or shut down.
    pub fn register(&self) -> bool {
        let mut state = self.state.lock();
        if state.shut_down {
            tracing::debug!(address = %self.handler_address, "session shut down, not registering");
            return false;
        }
        if state.registration.is_some() {
            tracing::info!(address = %self.handler_address, "already registered, ignoring");
            return false;
        }

        let mut queries = self.bus.subscribe(&self.handler_address);
        let subscription = queries.id();
        let gate = Arc::clone(&self.gate);
        self.spawner.spawn(async move {
            while let Some(msg) = queries.recv().await {
                let reply = gate.handle(msg.body());
                if !msg.reply(reply) {
                    tracing::debug!("query arrived without a reply channel");
                }
            }
            tracing::debug!("gate worker stopped");
        });

        state.registration = Some(RegistrationRecord {
            instance_id: self.instance_id,
            handler_address: self.handler_address.clone(),
            subscriptions: vec![subscription],
        });
        self.send_command(RegistrationCommand::register(&self.handler_address));
        tracing::info!(address = %self.handler_address, "registered gate handler");
        true
    }

    /// Send an `unregister` command and release the gate's subscriptions.
    ///
    /// Safe to call when not registered; returns `false` in that case.
    pub fn unregister(&self) -> bool {
        let mut state = self.state.lock();
        let Some(record) = state.registration.take() else {
            tracing::debug!("unregister without an active registration");
            return false;
        };

        self.send_command(RegistrationCommand::unregister(&record.handler_address));
        for id in record.subscriptions {
            if !self.bus.unsubscribe(id) {
                tracing::debug!(id, "subscription already released");
            }
        }
        tracing::info!(address = %record.handler_address, "unregistered gate handler");
        true
    }

    /// Listen for lifecycle signals and probe the scheduler; a reply to the
    /// probe triggers `register()`.
    pub fn start(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if state.shut_down {
                tracing::debug!("session shut down, not starting");
                return;
            }
            if state.lifecycle.is_some() {
                tracing::debug!("lifecycle listener already running");
            } else {
                let mut signals = self.bus.subscribe(&self.config.lifecycle_address);
                state.lifecycle = Some(signals.id());
                let me = Arc::clone(self);
                self.spawner.spawn(async move {
                    while let Some(msg) = signals.recv().await {
                        me.handle_signal(msg.body());
                    }
                    tracing::debug!("lifecycle listener stopped");
                });
            }
        }

        match self.bus.send(&self.config.control_address, queue_probe()) {
            Ok(pending) => {
                let me = Arc::clone(self);
                let timeout = self.config.reply_timeout();
                self.spawner.spawn(async move {
                    match pending.wait(timeout).await {
                        Ok(_) => {
                            tracing::debug!("scheduler answered liveness probe");
                            me.register();
                        }
                        Err(e) => {
                            tracing::warn!("liveness probe failed, waiting for started signal: {e}");
                        }
                    }
                });
            }
            Err(e) => tracing::warn!("liveness probe not sent, waiting for started signal: {e}"),
        }
    }

    /// React to one lifecycle signal payload.
    pub fn handle_signal(&self, body: &Value) {
        match LifecycleSignal::from_value(body) {
            LifecycleSignal::Started => {
                if !self.register() {
                    tracing::debug!("duplicate started signal");
                }
            }
            LifecycleSignal::Stopped => {
                if !self.unregister() {
                    tracing::debug!("stopped signal while not registered");
                }
            }
            LifecycleSignal::Other(action) => tracing::debug!(action = %action, "ignoring lifecycle signal"),
            LifecycleSignal::Missing => tracing::warn!("lifecycle signal without action"),
        }
    }

    /// Unregister and release the lifecycle listener. Later registration
    /// attempts are refused.
    pub fn shutdown(&self) {
        self.state.lock().shut_down = true;
        self.unregister();
        let lifecycle = self.state.lock().lifecycle.take();
        if let Some(id) = lifecycle {
            self.bus.unsubscribe(id);
        }
        tracing::info!(instance = %self.instance_id, "gate session shut down");
    }

    fn send_command(&self, command: RegistrationCommand) {
        let action = command.action.clone();
        match self.bus.send(&self.config.dispatcher_address, command.into_value()) {
            Ok(pending) => {
                let timeout = self.config.reply_timeout();
                self.spawner.spawn(async move {
                    match pending.wait(timeout).await {
                        Ok(reply) => tracing::info!(action = %action, reply = %reply, "scheduler acknowledged"),
                        Err(e) => tracing::warn!(action = %action, "no acknowledgment from scheduler: {e}"),
                    }
                });
            }
            Err(e) => tracing::warn!(action = %action, "failed to send command: {e}"),
        }
    }
}
