//! Tests for wire payload models

use queue_gate::runtime::api::{
    AdmissionQuery, AdmissionReply, LifecycleSignal, QueueItem, RegistrationCommand, StatusReply, TaskRef,
};
use serde_json::json;

#[test]
fn test_query_parses_scheduler_payload() {
    let raw = json!({
        "action": "canRun",
        "item": {
            "blocked": false,
            "buildable": true,
            "id": 5,
            "inQueueSince": 1348006835051u64,
            "params": "",
            "stuck": false,
            "task": { "name": "foo", "url": "http://localhost:8080/job/foo/" },
            "actions": [ { "causes": [] } ],
            "why": "Waiting for next available executor"
        }
    });
    let query = AdmissionQuery::from_value(&raw);
    assert_eq!(query.action.as_deref(), Some("canRun"));
    assert_eq!(query.task_name(), Some("foo"));
    let item = query.item.unwrap();
    assert_eq!(item.id, Some(5));
    assert_eq!(item.in_queue_since, Some(1_348_006_835_051));
}

#[test]
fn test_query_with_bad_field_keeps_task_name() {
    let raw = json!({ "action": "canRun", "item": { "id": "five", "task": { "name": "foo" } } });
    let query = AdmissionQuery::from_value(&raw);
    assert_eq!(query.task_name(), Some("foo"));
}

#[test]
fn test_query_with_non_string_name_has_no_name() {
    let raw = json!({ "action": "canRun", "item": { "task": { "name": 42 } } });
    assert_eq!(AdmissionQuery::from_value(&raw).task_name(), None);
}

#[test]
fn test_query_encodes_camel_case() {
    let mut item = QueueItem::for_task(TaskRef::named("build-A"));
    item.in_queue_since = Some(10);
    let body = AdmissionQuery::can_run(item).into_value();
    assert_eq!(body["action"], "canRun");
    assert_eq!(body["item"]["task"]["name"], "build-A");
    assert_eq!(body["item"]["inQueueSince"], 10);
    assert!(body["item"].get("stuck").is_none());
}

#[test]
fn test_admission_reply_shape() {
    let body = AdmissionReply {
        can_run: false,
        reason: "don't wanna".to_string(),
    }
    .into_value();
    assert_eq!(body, json!({ "canRun": false, "reason": "don't wanna" }));
}

#[test]
fn test_registration_command_shape() {
    assert_eq!(
        RegistrationCommand::register("queue-gate.1").into_value(),
        json!({ "action": "register", "handlerAddress": "queue-gate.1" })
    );
    assert_eq!(
        RegistrationCommand::unregister("queue-gate.1").into_value(),
        json!({ "action": "unregister", "handlerAddress": "queue-gate.1" })
    );
}

#[test]
fn test_lifecycle_signal_parsing() {
    assert_eq!(LifecycleSignal::from_value(&json!({ "action": "started" })), LifecycleSignal::Started);
    assert_eq!(LifecycleSignal::from_value(&json!({ "action": "stopped" })), LifecycleSignal::Stopped);
    assert_eq!(
        LifecycleSignal::from_value(&json!({ "action": "reloaded" })),
        LifecycleSignal::Other("reloaded".to_string())
    );
    assert_eq!(LifecycleSignal::from_value(&json!({ "addr": "jenkins-vertx" })), LifecycleSignal::Missing);
}

#[test]
fn test_status_reply_shapes() {
    assert_eq!(StatusReply::ok().into_value(), json!({ "status": "ok" }));
    assert!(StatusReply::ok().is_ok());
    assert_eq!(
        StatusReply::error("missing handlerAddress").into_value(),
        json!({ "status": "error", "message": "missing handlerAddress" })
    );
    assert_eq!(
        StatusReply::ok_with(json!({ "items": [] })).into_value(),
        json!({ "status": "ok", "result": { "items": [] } })
    );
}

#[test]
fn test_encoded_models_match_their_serde_form() {
    let query = AdmissionQuery {
        action: Some("canTake".to_string()),
        item: None,
    };
    assert_eq!(query.clone().into_value(), json!({ "action": "canTake" }));

    let command = RegistrationCommand::register("queue-gate.7");
    let decoded: RegistrationCommand = serde_json::from_value(command.clone().into_value()).unwrap();
    assert_eq!(decoded, command);
}
