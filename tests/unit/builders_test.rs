//! Tests for builder modules

use queue_gate::builders::{build_gate, build_session};
use queue_gate::config::GateConfig;
use queue_gate::core::GateError;
use queue_gate::infra::InMemoryBus;
use queue_gate::runtime::TokioSpawner;

#[test]
fn test_build_gate_uses_configured_policy() {
    let cfg = GateConfig {
        threshold: 2,
        ..GateConfig::default()
    };
    let gate = build_gate(&cfg);
    assert_eq!(gate.threshold(), 2);
    assert!(!gate.decide("t").can_run);
    assert!(!gate.decide("t").can_run);
    assert!(gate.decide("t").can_run);
}

#[tokio::test]
async fn test_build_session_is_unregistered() {
    let session = build_session(&GateConfig::default(), InMemoryBus::new(), TokioSpawner::current()).unwrap();
    assert!(!session.is_registered());
    assert!(session.record().is_none());
    assert!(session.handler_address().starts_with("queue-gate."));
    assert!(session.handler_address().ends_with(&session.instance_id().to_string()));
}

#[tokio::test]
async fn test_build_session_rejects_invalid_config() {
    let cfg = GateConfig {
        reply_timeout_secs: 0,
        ..GateConfig::default()
    };
    let result = build_session(&cfg, InMemoryBus::new(), TokioSpawner::current());
    assert!(matches!(result, Err(GateError::InvalidConfig(_))));
}
