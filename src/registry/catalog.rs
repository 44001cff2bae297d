//! Machine-readable schema document for external command generators.
//!
//! Served over `GET /schema/` so an LLM or operator tool can self-validate
//! payloads before sending them.

use serde_json::Value;

use super::CommandRegistry;

/// Serialize the full registry as a JSON array of command schemas.
pub fn to_json_schema(registry: &CommandRegistry) -> Value {
    match serde_json::to_value(registry.metadata_snapshot()) {
        Ok(value) => value,
        Err(_) => Value::Array(Vec::new()),
    }
}
