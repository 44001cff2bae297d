//! The generic command payload and result types.
//!
//! A [`CommandEnvelope`] is deliberately open-ended: `commandType` selects the
//! handler and the schema, every other field stays in a flattened JSON map
//! until the validator checks it against the registry entry. Keeping the raw
//! map around is what lets the validator ask "was this key present in the
//! payload?" instead of comparing decoded values against type defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BridgeError;

/// A single inbound command: type tag plus an extensible set of named fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "commandType", default)]
    pub command_type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CommandEnvelope {
    pub fn new(command_type: impl Into<String>) -> Self {
        Self {
            command_type: command_type.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter, mostly for tests and the demo CLI.
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Whether the raw payload carried this key at all. This is the presence
    /// policy for required value-typed parameters: an explicit `0` or `false`
    /// counts as provided, an absent key does not.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }

    pub fn i64_field(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }

    pub fn f64_field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    /// Decode the `patches` field. Absent means an empty patch list.
    pub fn patches(&self) -> Result<Vec<Patch>, BridgeError> {
        match self.fields.get("patches") {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                BridgeError::Validation {
                    message: format!("Field 'patches' is malformed: {e}"),
                }
            }),
        }
    }

    /// Decode the `batch` field into nested envelopes.
    pub fn batch(&self) -> Result<Vec<CommandEnvelope>, BridgeError> {
        match self.fields.get("batch") {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                BridgeError::Validation {
                    message: format!("Field 'batch' is malformed: {e}"),
                }
            }),
        }
    }

    /// The batch halt policy. Defaults to false: run every element.
    pub fn break_on_error(&self) -> bool {
        self.bool_field("breakOnError").unwrap_or(false)
    }
}

/// A declarative instruction to set one property to a wire-format value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    #[serde(rename = "property")]
    pub property: String,
    pub value: String,
}

/// The uniform result every handler, batch, and HTTP response produces.
/// Failure is signaled here, never via HTTP status or a propagated panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    #[serde(
        rename = "commandType",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub command_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            command_type: String::new(),
            output: None,
            data: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            command_type: String::new(),
            output: None,
            data: None,
        }
    }

    pub fn for_command(mut self, command_type: &str) -> Self {
        self.command_type = command_type.to_string();
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_data(mut self, data: BTreeMap<String, String>) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_land_in_the_flattened_map() {
        let envelope: CommandEnvelope = serde_json::from_value(json!({
            "commandType": "CreateNode",
            "name": "Panel",
            "active": false,
        }))
        .unwrap();
        assert_eq!(envelope.command_type, "CreateNode");
        assert_eq!(envelope.str_field("name"), Some("Panel"));
        assert_eq!(envelope.bool_field("active"), Some(false));
        assert!(!envelope.has_field("parent"));
    }

    #[test]
    fn explicit_default_values_still_count_as_present() {
        let envelope: CommandEnvelope = serde_json::from_value(json!({
            "commandType": "SetNodeActive",
            "target": "Panel",
            "active": false,
        }))
        .unwrap();
        assert!(envelope.has_field("active"));
    }

    #[test]
    fn patches_decode_from_the_wire_shape() {
        let envelope: CommandEnvelope = serde_json::from_value(json!({
            "commandType": "ModifyComponentProperties",
            "patches": [
                { "property": "color", "value": "[1, 0, 0]" },
                { "property": "fontSize", "value": "14" },
            ],
        }))
        .unwrap();
        let patches = envelope.patches().unwrap();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].property, "color");
        assert_eq!(patches[1].value, "14");
    }

    #[test]
    fn malformed_patches_are_a_validation_error() {
        let envelope: CommandEnvelope = serde_json::from_value(json!({
            "commandType": "ModifyComponentProperties",
            "patches": "not-an-array",
        }))
        .unwrap();
        assert!(envelope.patches().is_err());
    }

    #[test]
    fn missing_command_type_decodes_as_empty() {
        let envelope: CommandEnvelope = serde_json::from_value(json!({ "name": "X" })).unwrap();
        assert!(envelope.command_type.is_empty());
    }

    #[test]
    fn result_serializes_without_empty_optionals() {
        let json = serde_json::to_value(CommandResult::ok("done")).unwrap();
        assert_eq!(json, json!({ "success": true, "message": "done" }));
    }
}
