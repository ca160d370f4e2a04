//! Tests for utility functions

use queue_gate::util::{handler_address, now_ms};
use uuid::Uuid;

#[test]
fn test_handler_address_embeds_instance_id() {
    let id = Uuid::new_v4();
    let addr = handler_address("queue-gate", id);
    assert_eq!(addr, format!("queue-gate.{id}"));
}

#[test]
fn test_now_ms_is_recent() {
    // 2020-01-01T00:00:00Z
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    queue_gate::util::init_tracing();
    queue_gate::util::init_tracing();
}
