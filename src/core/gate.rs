//! Admission gate: answers "can this job run now?" queries.

use serde_json::{json, Value};

use crate::core::AttemptCounterStore;
use crate::runtime::api::{AdmissionQuery, AdmissionReply};

/// Action name for admission queries.
pub const ACTION_CAN_RUN: &str = "canRun";

/// Reserved action; acknowledged with an empty reply until it is defined.
pub const ACTION_CAN_TAKE: &str = "canTake";

/// Number of denied attempts before a task is admitted.
pub const DEFAULT_THRESHOLD: u64 = 4;

/// Fixed reason attached to every decision.
pub const DEFAULT_REASON: &str = "don't wanna";

/// Label used in logs and decisions for `canRun` queries that carry no task
/// name. Such queries are counted apart from every named task, including one
/// literally called by this label.
pub const UNNAMED_TASK: &str = "<unnamed>";

/// Outcome of a single admission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Task identifier the decision applies to.
    pub task: String,
    /// Whether the task may start now.
    pub can_run: bool,
    /// Attempt count after this query was recorded.
    pub attempts: u64,
}

/// Decides admission from per-task attempt counts.
///
/// The gate owns its counter store; nothing else can read or write it. All
/// work happens synchronously in [`AdmissionGate::handle`], whose return value
/// is the single reply for the query.
#[derive(Debug)]
pub struct AdmissionGate {
    store: AttemptCounterStore,
    threshold: u64,
    reason: String,
}

impl AdmissionGate {
    /// Create a gate with the default threshold and reason.
    pub fn new(store: AttemptCounterStore) -> Self {
        Self::with_policy(store, DEFAULT_THRESHOLD, DEFAULT_REASON)
    }

    /// Create a gate with a custom threshold and reason.
    pub fn with_policy(store: AttemptCounterStore, threshold: u64, reason: impl Into<String>) -> Self {
        Self {
            store,
            threshold,
            reason: reason.into(),
        }
    }

    /// Number of denied attempts before admission.
    pub const fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Attempts recorded so far for a task.
    pub fn attempts(&self, task_id: &str) -> u64 {
        self.store.get(task_id)
    }

    /// Attempts recorded so far for queries without a task name.
    pub fn unnamed_attempts(&self) -> u64 {
        self.store.get_unnamed()
    }

    /// Handle one raw query and return its reply.
    ///
    /// Never panics. `canRun` always yields `{canRun, reason}`; every other
    /// shape, including a missing action, yields `{}` and leaves the counters
    /// untouched.
    pub fn handle(&self, query: &Value) -> Value {
        let query = AdmissionQuery::from_value(query);

        match query.action.as_deref() {
            Some(ACTION_CAN_RUN) => {
                let decision = match query.task_name() {
                    Some(name) => self.decide(name),
                    None => {
                        tracing::warn!("canRun query without item.task.name, counting as {UNNAMED_TASK}");
                        self.decide_unnamed()
                    }
                };
                AdmissionReply {
                    can_run: decision.can_run,
                    reason: self.reason.clone(),
                }
                .into_value()
            }
            Some(ACTION_CAN_TAKE) => {
                tracing::debug!("canTake is reserved, acknowledging");
                json!({})
            }
            Some(other) => {
                tracing::debug!(action = other, "unrecognized action, acknowledging");
                json!({})
            }
            None => {
                tracing::warn!("query without action, acknowledging");
                json!({})
            }
        }
    }

    /// Record an attempt for `task` and decide whether it may run.
    pub fn decide(&self, task: &str) -> Decision {
        let previous = self.store.get_and_increment(task);
        self.conclude(task, previous)
    }

    /// Record an attempt for a query without a task name.
    pub fn decide_unnamed(&self) -> Decision {
        let previous = self.store.get_and_increment_unnamed();
        self.conclude(UNNAMED_TASK, previous)
    }

    fn conclude(&self, task: &str, previous: u64) -> Decision {
        let can_run = previous >= self.threshold;
        let attempts = previous + 1;

        if can_run {
            tracing::info!(task, attempts, "not blocked");
        } else {
            tracing::info!(task, attempts, "blocked");
        }

        Decision {
            task: task.to_owned(),
            can_run,
            attempts,
        }
    }
}
