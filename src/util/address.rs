//! Handler address generation.

use uuid::Uuid;

/// Reply address for a gate instance: `<prefix>.<instance id>`.
pub fn handler_address(prefix: &str, instance_id: Uuid) -> String {
    format!("{prefix}.{instance_id}")
}
