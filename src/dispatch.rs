//! Command routing: one validated envelope to exactly one handler.

use crate::envelope::{CommandEnvelope, CommandResult};
use crate::registry::ExecContext;
use crate::validate;

/// Route an envelope to its registered handler. A pure lookup-and-call:
/// no validation and no I/O of its own. An unknown command type — which
/// validation should have caught already — yields a failed result rather
/// than a panic.
pub fn dispatch(ctx: &mut ExecContext<'_>, envelope: &CommandEnvelope) -> CommandResult {
    let Some(handler) = ctx.registry.handler(&envelope.command_type) else {
        return CommandResult::fail(format!(
            "Unknown or disabled commandType: {}",
            envelope.command_type
        ))
        .for_command(&envelope.command_type);
    };
    match handler(ctx, envelope) {
        Ok(result) => result.for_command(&envelope.command_type),
        Err(e) => CommandResult::fail(e.to_string()).for_command(&envelope.command_type),
    }
}

/// The full per-envelope pipeline: validate, then dispatch.
pub fn execute(ctx: &mut ExecContext<'_>, envelope: &CommandEnvelope) -> CommandResult {
    let validation = validate::validate(ctx.registry, envelope);
    if !validation.success {
        return validation;
    }
    dispatch(ctx, envelope)
}
