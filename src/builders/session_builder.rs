//! Build a gate and its registration session from configuration.

use std::sync::Arc;

use crate::config::GateConfig;
use crate::core::{AdmissionGate, AttemptCounterStore, GateError, RegistrationSession};
use crate::infra::MessageBus;
use crate::runtime::Spawn;

/// Build an admission gate with a fresh counter store.
pub fn build_gate(cfg: &GateConfig) -> AdmissionGate {
    AdmissionGate::with_policy(AttemptCounterStore::new(), cfg.threshold, cfg.reason.clone())
}

/// Validate `cfg` and wire counter store, gate and session together.
///
/// The session is returned unstarted; call `start()` to listen for lifecycle
/// signals and probe the scheduler.
pub fn build_session<B, S>(
    cfg: &GateConfig,
    bus: B,
    spawner: S,
) -> Result<Arc<RegistrationSession<B, S>>, GateError>
where
    B: MessageBus,
    S: Spawn,
{
    cfg.validate()
        .map_err(|e| GateError::InvalidConfig(format!("config invalid: {e}")))?;

    let session = RegistrationSession::new(cfg.clone(), build_gate(cfg), bus, spawner);
    tracing::info!(
        instance = %session.instance_id(),
        address = session.handler_address(),
        threshold = cfg.threshold,
        "gate session built"
    );
    Ok(Arc::new(session))
}
