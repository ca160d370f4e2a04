//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use queue_gate::config::GateConfig;
use queue_gate::core::GateError;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_match_scheduler_addresses() {
    let cfg = GateConfig::default();
    assert_eq!(cfg.lifecycle_address, "jenkins-vertx");
    assert_eq!(cfg.dispatcher_address, "jenkins.queueTaskDispatcher");
    assert_eq!(cfg.control_address, "jenkins");
    assert_eq!(cfg.threshold, 4);
    assert_eq!(cfg.reason, "don't wanna");
    assert_eq!(cfg.reply_timeout(), Duration::from_secs(10));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_empty_address_is_invalid() {
    let cfg = GateConfig {
        control_address: "  ".to_string(),
        ..GateConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_shared_addresses_are_invalid() {
    let cfg = GateConfig {
        dispatcher_address: "jenkins".to_string(),
        ..GateConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_timeout_is_invalid() {
    let cfg = GateConfig {
        reply_timeout_secs: 0,
        ..GateConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_fills_defaults() {
    let json = r#"{ "threshold": 2, "reason": "not yet" }"#;
    let cfg = GateConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.threshold, 2);
    assert_eq!(cfg.reason, "not yet");
    assert_eq!(cfg.dispatcher_address, "jenkins.queueTaskDispatcher");
}

#[test]
fn test_from_json_rejects_garbage() {
    assert!(GateConfig::from_json_str("{ nope").is_err());
    assert!(GateConfig::from_json_str(r#"{ "reply_timeout_secs": 0 }"#).is_err());
}

#[test]
fn test_from_lookup_overrides() {
    let cfg = GateConfig::from_lookup(lookup_from(&[
        ("QUEUE_GATE_THRESHOLD", "7"),
        ("QUEUE_GATE_ADDRESS_PREFIX", "gate"),
        ("QUEUE_GATE_REPLY_TIMEOUT_SECS", " 3 "),
    ]))
    .unwrap();
    assert_eq!(cfg.threshold, 7);
    assert_eq!(cfg.address_prefix, "gate");
    assert_eq!(cfg.reply_timeout_secs, 3);
    assert_eq!(cfg.lifecycle_address, "jenkins-vertx");
}

#[test]
fn test_from_lookup_rejects_bad_number() {
    let err = GateConfig::from_lookup(lookup_from(&[("QUEUE_GATE_THRESHOLD", "four")])).unwrap_err();
    assert!(matches!(err, GateError::InvalidConfig(msg) if msg.contains("QUEUE_GATE_THRESHOLD")));
}

#[test]
fn test_from_lookup_validates() {
    let err = GateConfig::from_lookup(lookup_from(&[("QUEUE_GATE_LIFECYCLE_ADDRESS", "jenkins")])).unwrap_err();
    assert!(matches!(err, GateError::InvalidConfig(_)));
}
