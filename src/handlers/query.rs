//! Read-only scene queries.

use std::collections::BTreeMap;

use crate::envelope::CommandResult;
use crate::error::BridgeError;
use crate::registry::{param, CommandMetadata, CommandRegistry, ParamType};

pub fn register(registry: &CommandRegistry) {
    registry.register(
        CommandMetadata {
            command_type: "GetSceneHierarchy",
            description: "Returns the node hierarchy as indented text in the result output.",
            destructive: false,
            batchable: true,
            required: vec![],
            optional: vec![],
            handler_name: "QueryHandlers",
        },
        |ctx, _| {
            let text = ctx.scene.hierarchy_text();
            let count = ctx.scene.len();
            Ok(
                CommandResult::ok(format!("Scene contains {count} node(s)."))
                    .with_output(text),
            )
        },
    );

    registry.register(
        CommandMetadata {
            command_type: "DescribeNode",
            description: "Returns a node's state and component property values.",
            destructive: false,
            batchable: true,
            required: vec![param("target", ParamType::Str)],
            optional: vec![],
            handler_name: "QueryHandlers",
        },
        |ctx, envelope| {
            let target = envelope.str_field("target").ok_or(BridgeError::Validation {
                message: "Parameter 'target' must be a string.".to_string(),
            })?;
            let node = ctx.scene.node(target).ok_or(BridgeError::NotFound {
                what: format!("Node '{target}'"),
            })?;

            let mut data = BTreeMap::new();
            data.insert("active".to_string(), node.active.to_string());
            if let Some(parent) = &node.parent {
                data.insert("parent".to_string(), parent.clone());
            }
            for component in node.components.values() {
                for (property, value) in &component.properties {
                    data.insert(
                        format!("{}.{property}", component.type_name),
                        value.to_string(),
                    );
                }
            }
            Ok(CommandResult::ok(format!(
                "Node '{target}' has {} component(s).",
                node.components.len()
            ))
            .with_data(data))
        },
    );
}
