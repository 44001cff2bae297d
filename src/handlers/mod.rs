//! The built-in command set.
//!
//! `build_registry()` is the single startup integration point: it registers
//! every built-in command and returns the populated registry. The server
//! calls it before the listener binds, so a command is either routable for
//! the whole process lifetime or not at all.

pub mod component;
pub mod node;
pub mod query;

use crate::batch::{self, BatchReport};
use crate::envelope::CommandResult;
use crate::registry::{param, CommandMetadata, CommandRegistry, ParamType};

/// Build the complete command registry.
pub fn build_registry() -> CommandRegistry {
    let registry = CommandRegistry::new();
    node::register(&registry);
    component::register(&registry);
    query::register(&registry);
    register_batch(&registry);
    registry
}

/// Per-command results of a batch, serialized into the summary's `output`
/// field so callers can inspect individual outcomes.
fn batch_output(report: &BatchReport) -> CommandResult {
    let mut summary = report.summary.clone();
    if let Ok(serialized) = serde_json::to_string(&report.results) {
        summary = summary.with_output(serialized);
    }
    summary
}

fn register_batch(registry: &CommandRegistry) {
    registry.register(
        CommandMetadata {
            command_type: "ExecuteBatch",
            description: "Executes a list of commands in order. With breakOnError, the first failure aborts the remainder.",
            destructive: false,
            batchable: false,
            required: vec![param("batch", ParamType::CommandArray)],
            optional: vec![param("breakOnError", ParamType::Bool)],
            handler_name: "BatchHandler",
        },
        |ctx, envelope| {
            let envelopes = envelope.batch()?;
            let report = batch::run_batch(ctx, &envelopes, envelope.break_on_error());
            Ok(batch_output(&report))
        },
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::dispatch;
    use crate::envelope::CommandEnvelope;
    use crate::registry::ExecContext;
    use crate::scene::Scene;
    use serde_json::json;

    fn run(scene: &mut Scene, registry: &CommandRegistry, value: serde_json::Value) -> CommandResult {
        let mut ctx = ExecContext {
            scene,
            registry,
            depth: 0,
        };
        let envelope: CommandEnvelope = serde_json::from_value(value).unwrap();
        dispatch::execute(&mut ctx, &envelope)
    }

    #[test]
    fn the_full_command_set_is_registered() {
        let registry = build_registry();
        for command in [
            "CreateNode",
            "ModifyNode",
            "DeleteNode",
            "SetNodeActive",
            "AttachComponent",
            "DetachComponent",
            "ModifyComponentProperties",
            "GetSceneHierarchy",
            "DescribeNode",
            "ExecuteBatch",
        ] {
            assert!(registry.lookup(command).is_some(), "{command} missing");
        }
    }

    #[test]
    fn batch_builds_a_scene_end_to_end() {
        let registry = build_registry();
        let mut scene = Scene::new();
        let result = run(
            &mut scene,
            &registry,
            json!({
                "commandType": "ExecuteBatch",
                "breakOnError": true,
                "batch": [
                    { "commandType": "CreateNode", "name": "Root" },
                    { "commandType": "CreateNode", "name": "Panel", "parent": "Root" },
                    {
                        "commandType": "AttachComponent",
                        "target": "Panel",
                        "componentType": "Label",
                        "patches": [{ "property": "text", "value": "Hello" }],
                    },
                ],
            }),
        );
        assert!(result.success, "{}", result.message);
        assert_eq!(scene.len(), 2);
        assert!(scene.node("Panel").unwrap().components.contains_key("Label"));
        // The output carries each per-command result.
        let results: Vec<CommandResult> =
            serde_json::from_str(&result.output.unwrap()).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.success));
    }

    #[test]
    fn batch_break_on_error_stops_mutating() {
        let registry = build_registry();
        let mut scene = Scene::new();
        let result = run(
            &mut scene,
            &registry,
            json!({
                "commandType": "ExecuteBatch",
                "breakOnError": true,
                "batch": [
                    { "commandType": "CreateNode", "name": "First" },
                    { "commandType": "DeleteNode", "target": "Ghost" },
                    { "commandType": "CreateNode", "name": "Never" },
                ],
            }),
        );
        assert!(!result.success);
        assert!(result.message.contains("halted"));
        assert!(result.message.contains("'DeleteNode'"));
        assert!(scene.node("First").is_some());
        assert!(scene.node("Never").is_none());
    }

    #[test]
    fn nested_batches_execute_within_the_depth_guard() {
        let registry = build_registry();
        let mut scene = Scene::new();
        let result = run(
            &mut scene,
            &registry,
            json!({
                "commandType": "ExecuteBatch",
                "batch": [{
                    "commandType": "ExecuteBatch",
                    "batch": [{ "commandType": "CreateNode", "name": "Deep" }],
                }],
            }),
        );
        assert!(result.success, "{}", result.message);
        assert!(scene.node("Deep").is_some());
    }

    #[test]
    fn runaway_nesting_is_rejected() {
        let registry = build_registry();
        let mut scene = Scene::new();
        // Five levels of nesting against a depth guard of four.
        let mut payload = json!({ "commandType": "CreateNode", "name": "Bottom" });
        for _ in 0..5 {
            payload = json!({ "commandType": "ExecuteBatch", "batch": [payload] });
        }
        let result = run(&mut scene, &registry, payload);
        assert!(!result.success);
        assert!(scene.is_empty());
    }

    #[test]
    fn empty_batch_array_fails_validation() {
        let registry = build_registry();
        let mut scene = Scene::new();
        let result = run(
            &mut scene,
            &registry,
            json!({ "commandType": "ExecuteBatch", "batch": [] }),
        );
        assert!(!result.success);
        assert!(result.message.contains("'batch' is empty"));
    }
}
