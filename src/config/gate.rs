//! Gate configuration: bus addresses, admission policy and reply timeouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::gate::{DEFAULT_REASON, DEFAULT_THRESHOLD};
use crate::core::GateError;

/// Default lifecycle signal address.
pub const DEFAULT_LIFECYCLE_ADDRESS: &str = "jenkins-vertx";
/// Default queue dispatcher address.
pub const DEFAULT_DISPATCHER_ADDRESS: &str = "jenkins.queueTaskDispatcher";
/// Default scheduler control address.
pub const DEFAULT_CONTROL_ADDRESS: &str = "jenkins";
/// Default prefix for generated handler addresses.
pub const DEFAULT_ADDRESS_PREFIX: &str = "queue-gate";
/// Default reply timeout in seconds.
pub const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 10;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "QUEUE_GATE_";

/// Gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Address the scheduler publishes `started`/`stopped` signals on.
    pub lifecycle_address: String,
    /// Address accepting `register`/`unregister` commands.
    pub dispatcher_address: String,
    /// Scheduler control address used for the liveness probe.
    pub control_address: String,
    /// Prefix for the generated gate address.
    pub address_prefix: String,
    /// Denied attempts before a task is admitted.
    pub threshold: u64,
    /// Reason attached to every decision.
    pub reason: String,
    /// How long to wait for replies, in seconds.
    pub reply_timeout_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            lifecycle_address: DEFAULT_LIFECYCLE_ADDRESS.to_owned(),
            dispatcher_address: DEFAULT_DISPATCHER_ADDRESS.to_owned(),
            control_address: DEFAULT_CONTROL_ADDRESS.to_owned(),
            address_prefix: DEFAULT_ADDRESS_PREFIX.to_owned(),
            threshold: DEFAULT_THRESHOLD,
            reason: DEFAULT_REASON.to_owned(),
            reply_timeout_secs: DEFAULT_REPLY_TIMEOUT_SECS,
        }
    }
}

impl GateConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        let addresses = [
            ("lifecycle_address", &self.lifecycle_address),
            ("dispatcher_address", &self.dispatcher_address),
            ("control_address", &self.control_address),
            ("address_prefix", &self.address_prefix),
        ];
        for (field, value) in addresses {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
        }
        if self.lifecycle_address == self.dispatcher_address
            || self.lifecycle_address == self.control_address
            || self.dispatcher_address == self.control_address
        {
            return Err("lifecycle, dispatcher and control addresses must be distinct".into());
        }
        if self.reply_timeout_secs == 0 {
            return Err("reply_timeout_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Reply timeout as a `Duration`.
    pub const fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }

    /// Parse configuration from a JSON string and validate. Missing fields
    /// take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from the process environment, reading a `.env` file first if one
    /// exists. Recognized keys are `QUEUE_GATE_*` upper-cased field names.
    pub fn from_env() -> Result<Self, GateError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from defaults plus overrides supplied by `lookup`, then validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |field: &str| lookup(&format!("{ENV_PREFIX}{}", field.to_ascii_uppercase()));
        let mut cfg = Self::default();

        if let Some(v) = get("lifecycle_address") {
            cfg.lifecycle_address = v;
        }
        if let Some(v) = get("dispatcher_address") {
            cfg.dispatcher_address = v;
        }
        if let Some(v) = get("control_address") {
            cfg.control_address = v;
        }
        if let Some(v) = get("address_prefix") {
            cfg.address_prefix = v;
        }
        if let Some(v) = get("threshold") {
            cfg.threshold = parse_u64("threshold", &v)?;
        }
        if let Some(v) = get("reason") {
            cfg.reason = v;
        }
        if let Some(v) = get("reply_timeout_secs") {
            cfg.reply_timeout_secs = parse_u64("reply_timeout_secs", &v)?;
        }

        cfg.validate().map_err(GateError::InvalidConfig)?;
        Ok(cfg)
    }
}

fn parse_u64(field: &str, raw: &str) -> Result<u64, GateError> {
    raw.trim()
        .parse()
        .map_err(|e| GateError::InvalidConfig(format!("{ENV_PREFIX}{} = {raw:?}: {e}", field.to_ascii_uppercase())))
}
