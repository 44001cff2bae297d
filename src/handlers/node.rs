//! Node lifecycle commands.

use crate::envelope::CommandResult;
use crate::error::BridgeError;
use crate::registry::{param, CommandMetadata, CommandRegistry, ParamType};

pub fn register(registry: &CommandRegistry) {
    registry.register(
        CommandMetadata {
            command_type: "CreateNode",
            description: "Creates a new named node, optionally parented under an existing node.",
            destructive: false,
            batchable: true,
            required: vec![param("name", ParamType::Str)],
            optional: vec![param("parent", ParamType::Str), param("active", ParamType::Bool)],
            handler_name: "NodeHandlers",
        },
        |ctx, envelope| {
            let name = envelope.str_field("name").ok_or(BridgeError::Validation {
                message: "Parameter 'name' must be a string.".to_string(),
            })?;
            let parent = envelope.str_field("parent");
            ctx.scene.create_node(name, parent)?;
            if let Some(active) = envelope.bool_field("active") {
                if let Some(node) = ctx.scene.node_mut(name) {
                    node.active = active;
                }
            }
            Ok(CommandResult::ok(format!("Node '{name}' created.")))
        },
    );

    registry.register(
        CommandMetadata {
            command_type: "ModifyNode",
            description: "Renames, reparents, or toggles an existing node.",
            destructive: false,
            batchable: true,
            required: vec![param("target", ParamType::Str)],
            optional: vec![
                param("newName", ParamType::Str),
                param("parent", ParamType::Str),
                param("active", ParamType::Bool),
            ],
            handler_name: "NodeHandlers",
        },
        |ctx, envelope| {
            let target = envelope.str_field("target").ok_or(BridgeError::Validation {
                message: "Parameter 'target' must be a string.".to_string(),
            })?;
            if ctx.scene.node(target).is_none() {
                return Err(BridgeError::NotFound {
                    what: format!("Node '{target}'"),
                });
            }

            let mut changes = Vec::new();
            if let Some(parent) = envelope.str_field("parent") {
                if ctx.scene.node(parent).is_none() {
                    return Err(BridgeError::NotFound {
                        what: format!("Parent node '{parent}'"),
                    });
                }
                if let Some(node) = ctx.scene.node_mut(target) {
                    node.parent = Some(parent.to_string());
                }
                changes.push(format!("parent set to '{parent}'"));
            }
            if let Some(active) = envelope.bool_field("active") {
                if let Some(node) = ctx.scene.node_mut(target) {
                    node.active = active;
                }
                changes.push(format!("active set to {active}"));
            }
            // Rename last so the earlier edits address the node by its
            // original name.
            let mut final_name = target.to_string();
            if let Some(new_name) = envelope.str_field("newName") {
                ctx.scene.rename_node(target, new_name)?;
                changes.push(format!("renamed to '{new_name}'"));
                final_name = new_name.to_string();
            }

            if changes.is_empty() {
                return Ok(CommandResult::ok(format!(
                    "Node '{final_name}' unchanged: no modifications requested."
                )));
            }
            Ok(CommandResult::ok(format!(
                "Node '{final_name}' modified: {}.",
                changes.join(", ")
            )))
        },
    );

    registry.register(
        CommandMetadata {
            command_type: "DeleteNode",
            description: "Deletes a node and all of its descendants.",
            destructive: true,
            batchable: true,
            required: vec![param("target", ParamType::Str)],
            optional: vec![],
            handler_name: "NodeHandlers",
        },
        |ctx, envelope| {
            let target = envelope.str_field("target").ok_or(BridgeError::Validation {
                message: "Parameter 'target' must be a string.".to_string(),
            })?;
            let removed = ctx.scene.delete_node(target)?;
            Ok(CommandResult::ok(format!(
                "Node '{target}' deleted ({removed} node(s) removed)."
            )))
        },
    );

    registry.register(
        CommandMetadata {
            command_type: "SetNodeActive",
            description: "Activates or deactivates a node.",
            destructive: false,
            batchable: true,
            required: vec![
                param("target", ParamType::Str),
                param("active", ParamType::Bool),
            ],
            optional: vec![],
            handler_name: "NodeHandlers",
        },
        |ctx, envelope| {
            let target = envelope.str_field("target").ok_or(BridgeError::Validation {
                message: "Parameter 'target' must be a string.".to_string(),
            })?;
            let active = envelope.bool_field("active").ok_or(BridgeError::Validation {
                message: "Parameter 'active' must be a boolean.".to_string(),
            })?;
            let node = ctx.scene.node_mut(target).ok_or(BridgeError::NotFound {
                what: format!("Node '{target}'"),
            })?;
            node.active = active;
            Ok(CommandResult::ok(format!(
                "Node '{target}' active set to {active}."
            )))
        },
    );
}
