//! Payload validation against the schema registry.
//!
//! Validation is pure: it never mutates state and never invokes a handler.
//! An unregistered command type is a hard failure — there is no
//! "permit everything" fallback.

use serde_json::Value;

use crate::envelope::{CommandEnvelope, CommandResult};
use crate::registry::{CommandRegistry, ParamType, ParameterMetadata};

/// Validate an envelope's completeness against its registered schema.
pub fn validate(registry: &CommandRegistry, envelope: &CommandEnvelope) -> CommandResult {
    if envelope.command_type.is_empty() {
        return CommandResult::fail("Command validation failed: 'commandType' is missing.");
    }

    let Some(metadata) = registry.lookup(&envelope.command_type) else {
        return CommandResult::fail(format!(
            "Command validation failed: Unknown commandType '{}'. No metadata found for validation.",
            envelope.command_type
        ))
        .for_command(&envelope.command_type);
    };

    for parameter in &metadata.required {
        if let Some(failure) = check_required(envelope, parameter) {
            return failure.for_command(&envelope.command_type);
        }
    }

    CommandResult::ok("Command validated successfully.").for_command(&envelope.command_type)
}

/// One required parameter: raw-key presence first, then the type-specific
/// emptiness rules. A numeric or boolean parameter counts as provided as
/// soon as its key exists, even when the value equals the type's default.
fn check_required(envelope: &CommandEnvelope, parameter: &ParameterMetadata) -> Option<CommandResult> {
    let command_type = &envelope.command_type;
    let name = parameter.name;

    let Some(value) = envelope.field(name) else {
        return Some(CommandResult::fail(format!(
            "Command validation failed for '{command_type}': Required parameter '{name}' is missing."
        )));
    };
    if value.is_null() {
        return Some(CommandResult::fail(format!(
            "Command validation failed for '{command_type}': Required parameter '{name}' is missing (null)."
        )));
    }

    match parameter.param_type {
        ParamType::Str => {
            if matches!(value, Value::String(s) if s.is_empty()) {
                return Some(CommandResult::fail(format!(
                    "Command validation failed for '{command_type}': Required string parameter '{name}' is empty."
                )));
            }
        }
        t if t.is_array() => {
            if matches!(value, Value::Array(items) if items.is_empty()) {
                return Some(CommandResult::fail(format!(
                    "Command validation failed for '{command_type}': Required array parameter '{name}' is empty."
                )));
            }
        }
        _ => {}
    }
    None
}
