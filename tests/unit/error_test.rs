//! Tests for error types

use std::time::Duration;

use queue_gate::core::GateError;

#[test]
fn test_no_handlers_error() {
    let err = GateError::NoHandlers("jenkins".to_string());
    assert_eq!(format!("{}", err), "no handlers for address jenkins");
}

#[test]
fn test_reply_timeout_error() {
    let err = GateError::ReplyTimeout {
        address: "queue-gate.x".to_string(),
        timeout: Duration::from_secs(10),
    };
    assert_eq!(format!("{}", err), "timed out after 10s waiting for reply from queue-gate.x");
}

#[test]
fn test_reply_dropped_error() {
    let err = GateError::ReplyDropped("jenkins".to_string());
    assert_eq!(format!("{}", err), "reply dropped by jenkins");
}

#[test]
fn test_invalid_config_error() {
    let err = GateError::InvalidConfig("threshold".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: threshold");
}

#[test]
fn test_backend_error() {
    let err = GateError::Backend("connection failed".to_string());
    assert_eq!(format!("{}", err), "backend error: connection failed");
}
