//! Component attachment and property patching.

use crate::convert;
use crate::envelope::{CommandResult, Patch};
use crate::error::BridgeError;
use crate::registry::{param, CommandMetadata, CommandRegistry, ParamType};
use crate::scene::{component_spec, Component, Scene};

/// Apply patches to one component, converting each wire value against the
/// declared property type. Patch application is not transactional: a failed
/// patch is recorded and the rest still apply.
fn apply_patches(
    scene: &mut Scene,
    target: &str,
    component_type: &str,
    patches: &[Patch],
) -> Result<(usize, Vec<String>), BridgeError> {
    let node = scene.node_mut(target).ok_or(BridgeError::NotFound {
        what: format!("Node '{target}'"),
    })?;
    let component = node
        .components
        .get_mut(component_type)
        .ok_or(BridgeError::NotFound {
            what: format!("Component '{component_type}' on node '{target}'"),
        })?;

    let mut applied = 0;
    let mut failures = Vec::new();
    for patch in patches {
        let Some(target_type) = component.property_type(&patch.property) else {
            failures.push(format!(
                "property '{}' does not exist on '{component_type}'",
                patch.property
            ));
            continue;
        };
        match convert::convert(&patch.value, target_type) {
            Ok(value) => {
                component.properties.insert(patch.property.clone(), value);
                applied += 1;
            }
            Err(e) => failures.push(
                BridgeError::conversion(&patch.property, &patch.value, &e).to_string(),
            ),
        }
    }
    Ok((applied, failures))
}

fn patch_summary(
    component_type: &str,
    target: &str,
    applied: usize,
    failures: &[String],
) -> CommandResult {
    if failures.is_empty() {
        CommandResult::ok(format!(
            "Applied {applied} patch(es) to '{component_type}' on '{target}'."
        ))
    } else {
        CommandResult::fail(format!(
            "Applied {applied} patch(es) to '{component_type}' on '{target}', {} failed: {}",
            failures.len(),
            failures.join("; ")
        ))
    }
}

pub fn register(registry: &CommandRegistry) {
    registry.register(
        CommandMetadata {
            command_type: "AttachComponent",
            description: "Attaches a component of the given type to a node, optionally applying initial property patches.",
            destructive: false,
            batchable: true,
            required: vec![
                param("target", ParamType::Str),
                param("componentType", ParamType::Str),
            ],
            optional: vec![param("patches", ParamType::PatchArray)],
            handler_name: "ComponentHandlers",
        },
        |ctx, envelope| {
            let target = envelope.str_field("target").ok_or(BridgeError::Validation {
                message: "Parameter 'target' must be a string.".to_string(),
            })?;
            let component_type = envelope
                .str_field("componentType")
                .ok_or(BridgeError::Validation {
                    message: "Parameter 'componentType' must be a string.".to_string(),
                })?;
            let patches = envelope.patches()?;

            let spec = component_spec(component_type).ok_or(BridgeError::NotFound {
                what: format!("Component type '{component_type}'"),
            })?;
            let node = ctx.scene.node_mut(target).ok_or(BridgeError::NotFound {
                what: format!("Node '{target}'"),
            })?;
            if node.components.contains_key(component_type) {
                return Err(BridgeError::Validation {
                    message: format!(
                        "Node '{target}' already has a '{component_type}' component"
                    ),
                });
            }
            node.components
                .insert(component_type.to_string(), Component::from_spec(spec));

            if patches.is_empty() {
                return Ok(CommandResult::ok(format!(
                    "Component '{component_type}' attached to '{target}'."
                )));
            }
            let (applied, failures) =
                apply_patches(ctx.scene, target, component_type, &patches)?;
            if failures.is_empty() {
                Ok(CommandResult::ok(format!(
                    "Component '{component_type}' attached to '{target}' with {applied} patch(es)."
                )))
            } else {
                // The component stays attached; only the summary fails.
                Ok(patch_summary(component_type, target, applied, &failures))
            }
        },
    );

    registry.register(
        CommandMetadata {
            command_type: "DetachComponent",
            description: "Removes a component from a node.",
            destructive: true,
            batchable: true,
            required: vec![
                param("target", ParamType::Str),
                param("componentType", ParamType::Str),
            ],
            optional: vec![],
            handler_name: "ComponentHandlers",
        },
        |ctx, envelope| {
            let target = envelope.str_field("target").ok_or(BridgeError::Validation {
                message: "Parameter 'target' must be a string.".to_string(),
            })?;
            let component_type = envelope
                .str_field("componentType")
                .ok_or(BridgeError::Validation {
                    message: "Parameter 'componentType' must be a string.".to_string(),
                })?;
            let node = ctx.scene.node_mut(target).ok_or(BridgeError::NotFound {
                what: format!("Node '{target}'"),
            })?;
            if node.components.shift_remove(component_type).is_none() {
                return Err(BridgeError::NotFound {
                    what: format!("Component '{component_type}' on node '{target}'"),
                });
            }
            Ok(CommandResult::ok(format!(
                "Component '{component_type}' detached from '{target}'."
            )))
        },
    );

    registry.register(
        CommandMetadata {
            command_type: "ModifyComponentProperties",
            description: "Applies property patches to an existing component. Failed patches are reported; the rest still apply.",
            destructive: false,
            batchable: true,
            required: vec![
                param("target", ParamType::Str),
                param("componentType", ParamType::Str),
                param("patches", ParamType::PatchArray),
            ],
            optional: vec![],
            handler_name: "ComponentHandlers",
        },
        |ctx, envelope| {
            let target = envelope.str_field("target").ok_or(BridgeError::Validation {
                message: "Parameter 'target' must be a string.".to_string(),
            })?;
            let component_type = envelope
                .str_field("componentType")
                .ok_or(BridgeError::Validation {
                    message: "Parameter 'componentType' must be a string.".to_string(),
                })?;
            let patches = envelope.patches()?;
            let (applied, failures) =
                apply_patches(ctx.scene, target, component_type, &patches)?;
            Ok(patch_summary(component_type, target, applied, &failures))
        },
    );
}
