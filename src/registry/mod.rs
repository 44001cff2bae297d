//! The process-wide command catalog: schema metadata and handler routing.
//!
//! Registration and routing are two views of one declaration — a single
//! [`CommandRegistry::register`] call installs both the declarative schema
//! the validator checks against and the handler function the dispatcher
//! routes to. All registration happens inside `handlers::build_registry()`
//! before the network listener binds, so there is no load-order dependence.

pub mod catalog;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::warn;

use crate::envelope::{CommandEnvelope, CommandResult};
use crate::error::BridgeError;
use crate::scene::Scene;

/// Wire-level type of a command parameter, used for validation and for the
/// machine-readable schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamType {
    #[serde(rename = "string")]
    Str,
    Int,
    Float,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Color,
    #[serde(rename = "stringArray")]
    StrArray,
    PatchArray,
    CommandArray,
}

impl ParamType {
    /// Required-parameter emptiness rule: strings must be non-empty, arrays
    /// must have at least one element, everything else is presence-only.
    pub fn is_array(self) -> bool {
        matches!(
            self,
            ParamType::StrArray | ParamType::PatchArray | ParamType::CommandArray
        )
    }
}

/// `(name, expectedType)` pair for one declared parameter.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParameterMetadata {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub param_type: ParamType,
}

/// Shorthand constructor used by registration code.
pub const fn param(name: &'static str, param_type: ParamType) -> ParameterMetadata {
    ParameterMetadata { name, param_type }
}

/// Everything the validator and the schema document need to know about one
/// command type. One instance per type; registered once, read many times.
#[derive(Debug, Clone, Serialize)]
pub struct CommandMetadata {
    #[serde(rename = "commandType")]
    pub command_type: &'static str,
    pub description: &'static str,
    #[serde(rename = "isDestructive")]
    pub destructive: bool,
    #[serde(rename = "isBatchable")]
    pub batchable: bool,
    #[serde(rename = "requiredParameters")]
    pub required: Vec<ParameterMetadata>,
    #[serde(rename = "optionalParameters")]
    pub optional: Vec<ParameterMetadata>,
    #[serde(rename = "handler")]
    pub handler_name: &'static str,
}

/// Execution context a handler runs in: the live scene, the registry (for
/// nested batch execution) and the current batch nesting depth.
pub struct ExecContext<'a> {
    pub scene: &'a mut Scene,
    pub registry: &'a CommandRegistry,
    pub depth: u8,
}

/// A registered handler. Handlers run only on the apply thread and return
/// either a result or an error the dispatcher folds into a failed result.
pub type HandlerFn =
    Arc<dyn Fn(&mut ExecContext<'_>, &CommandEnvelope) -> Result<CommandResult, BridgeError> + Send + Sync>;

/// Mapping from command type to metadata and handler. Writes happen at
/// startup; runtime access is concurrent lookup only.
#[derive(Default)]
pub struct CommandRegistry {
    schemas: RwLock<HashMap<String, CommandMetadata>>,
    handlers: RwLock<HashMap<String, HandlerFn>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command type. Re-registration overwrites the previous
    /// entry with a warning, so a reloaded handler module wins.
    pub fn register<F>(&self, metadata: CommandMetadata, handler: F)
    where
        F: Fn(&mut ExecContext<'_>, &CommandEnvelope) -> Result<CommandResult, BridgeError>
            + Send
            + Sync
            + 'static,
    {
        let command_type = metadata.command_type;
        if self.schemas.read().contains_key(command_type) {
            warn!("Command '{command_type}' is already registered. Overwriting.");
        }
        self.schemas
            .write()
            .insert(command_type.to_string(), metadata);
        self.handlers
            .write()
            .insert(command_type.to_string(), Arc::new(handler));
    }

    pub fn lookup(&self, command_type: &str) -> Option<CommandMetadata> {
        self.schemas.read().get(command_type).cloned()
    }

    /// Handler for a command type. The returned `Arc` is called after the
    /// lock is released so nested dispatch (batches) cannot self-deadlock.
    pub fn handler(&self, command_type: &str) -> Option<HandlerFn> {
        self.handlers.read().get(command_type).cloned()
    }

    /// All metadata entries, sorted by command type for stable output.
    pub fn metadata_snapshot(&self) -> Vec<CommandMetadata> {
        let mut entries: Vec<CommandMetadata> = self.schemas.read().values().cloned().collect();
        entries.sort_by_key(|m| m.command_type);
        entries
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}
