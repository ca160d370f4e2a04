//! Wire payload models exchanged over the message bus.
//!
//! Inbound payloads are parsed leniently: a field of the wrong type is treated
//! as absent rather than failing the whole message, because a malformed query
//! must still be answered.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Registration command action.
pub const ACTION_REGISTER: &str = "register";
/// Unregistration command action.
pub const ACTION_UNREGISTER: &str = "unregister";
/// Liveness probe / queue listing action.
pub const ACTION_GET_QUEUE: &str = "getQueue";
/// Known-jobs listing action.
pub const ACTION_GET_ALL_ITEMS: &str = "getAllItems";
/// One-shot build scheduling action.
pub const ACTION_SCHEDULE_BUILD: &str = "scheduleBuild";
/// Lifecycle signal sent when the scheduler comes up.
pub const SIGNAL_STARTED: &str = "started";
/// Lifecycle signal sent when the scheduler goes down.
pub const SIGNAL_STOPPED: &str = "stopped";

/// Reference to the schedulable unit behind a queue item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    /// Logical job name; used as the task identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Job URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TaskRef {
    /// Task reference with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: None,
        }
    }
}

/// A queued job instance as described by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    /// Queue item identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// The task to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskRef>,
    /// Whether the scheduler already considers the item blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
    /// Whether the item is buildable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildable: Option<bool>,
    /// Enqueue time, milliseconds since epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_queue_since: Option<u64>,
    /// Build parameters rendered as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,
    /// Whether the item is stuck.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stuck: Option<bool>,
    /// Human-readable reason the item is still waiting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
}

impl QueueItem {
    /// Queue item carrying only a task reference.
    pub fn for_task(task: TaskRef) -> Self {
        Self {
            task: Some(task),
            ..Self::default()
        }
    }

    /// Task name, if present.
    pub fn task_name(&self) -> Option<&str> {
        self.task.as_ref()?.name.as_deref()
    }
}

/// Query asking the gate about a queue item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmissionQuery {
    /// `canRun`, reserved `canTake`, or anything else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// The queue item in question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<QueueItem>,
}

impl AdmissionQuery {
    /// Build a `canRun` query for an item.
    pub fn can_run(item: QueueItem) -> Self {
        Self {
            action: Some(crate::core::gate::ACTION_CAN_RUN.to_owned()),
            item: Some(item),
        }
    }

    /// Parse a raw payload, treating anything unreadable as absent.
    pub fn from_value(value: &Value) -> Self {
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let item = value.get("item").map(|raw| {
            serde_json::from_value::<QueueItem>(raw.clone()).unwrap_or_else(|e| {
                tracing::warn!("unreadable queue item ({e}), keeping task name only");
                let name = raw.pointer("/task/name").and_then(Value::as_str);
                QueueItem {
                    task: Some(TaskRef {
                        name: name.map(str::to_owned),
                        url: None,
                    }),
                    ..QueueItem::default()
                }
            })
        });
        Self { action, item }
    }

    /// Task name, if the query carries one.
    pub fn task_name(&self) -> Option<&str> {
        self.item.as_ref()?.task_name()
    }

    /// Encode for the wire.
    pub fn into_value(self) -> Value {
        to_wire(&self)
    }
}

/// Gate answer to a `canRun` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReply {
    /// Decision.
    pub can_run: bool,
    /// Human-readable reason; not meant to be parsed.
    pub reason: String,
}

impl AdmissionReply {
    /// Encode for the wire.
    pub fn into_value(self) -> Value {
        to_wire(&self)
    }
}

/// Command sent to the scheduler's dispatcher address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCommand {
    /// `register` or `unregister`.
    pub action: String,
    /// Address the scheduler should send queries to.
    pub handler_address: String,
}

impl RegistrationCommand {
    /// A `register` command.
    pub fn register(handler_address: impl Into<String>) -> Self {
        Self {
            action: ACTION_REGISTER.to_owned(),
            handler_address: handler_address.into(),
        }
    }

    /// An `unregister` command.
    pub fn unregister(handler_address: impl Into<String>) -> Self {
        Self {
            action: ACTION_UNREGISTER.to_owned(),
            handler_address: handler_address.into(),
        }
    }

    /// Encode for the wire.
    pub fn into_value(self) -> Value {
        to_wire(&self)
    }
}

/// Scheduler lifecycle signal published on the lifecycle address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// Scheduler came up.
    Started,
    /// Scheduler is going down.
    Stopped,
    /// Some other action.
    Other(String),
    /// Payload had no readable action.
    Missing,
}

impl LifecycleSignal {
    /// Parse a raw payload.
    pub fn from_value(value: &Value) -> Self {
        match value.get("action").and_then(Value::as_str) {
            Some(SIGNAL_STARTED) => Self::Started,
            Some(SIGNAL_STOPPED) => Self::Stopped,
            Some(other) => Self::Other(other.to_owned()),
            None => Self::Missing,
        }
    }

    /// Encode for the wire. `Missing` encodes as an empty object.
    pub fn into_value(self) -> Value {
        match self {
            Self::Started => json!({ "action": SIGNAL_STARTED }),
            Self::Stopped => json!({ "action": SIGNAL_STOPPED }),
            Self::Other(action) => json!({ "action": action }),
            Self::Missing => json!({}),
        }
    }
}

/// Status reply used by the scheduler's control and dispatcher addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReply {
    /// `ok` or `error`.
    pub status: String,
    /// Error message, present when `status == "error"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl StatusReply {
    /// Plain `ok`.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_owned(),
            message: None,
            result: None,
        }
    }

    /// `ok` with a result payload.
    pub fn ok_with(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::ok()
        }
    }

    /// `error` with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_owned(),
            message: Some(message.into()),
            result: None,
        }
    }

    /// True for `ok` replies.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Encode for the wire.
    pub fn into_value(self) -> Value {
        to_wire(&self)
    }
}

/// Liveness probe body sent to the scheduler control address.
pub fn queue_probe() -> Value {
    json!({ "action": ACTION_GET_QUEUE })
}

// Only fails for maps with non-string keys, which none of these models have.
fn to_wire<T: Serialize>(model: &T) -> Value {
    serde_json::to_value(model).unwrap_or_else(|e| {
        tracing::error!("unable to encode payload: {e}");
        json!({})
    })
}
