//! Ordered batch execution with a configurable halt policy.

use crate::dispatch;
use crate::envelope::{CommandEnvelope, CommandResult};
use crate::registry::ExecContext;

/// Batches arrive as attacker- or model-supplied data, so nesting is
/// bounded rather than trusted.
pub const MAX_BATCH_DEPTH: u8 = 4;

/// Outcome of a batch run: the summary plus every per-command result, in
/// array order. Individual outcomes are never collapsed away.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summary: CommandResult,
    pub results: Vec<CommandResult>,
}

/// Execute envelopes strictly in order, each through the full
/// validate→dispatch pipeline.
///
/// With `break_on_error` the first failure aborts the remainder and the
/// summary carries that failure. Otherwise all elements run and the
/// summary reports the last result encountered.
pub fn run_batch(
    ctx: &mut ExecContext<'_>,
    envelopes: &[CommandEnvelope],
    break_on_error: bool,
) -> BatchReport {
    if ctx.depth >= MAX_BATCH_DEPTH {
        return BatchReport {
            summary: CommandResult::fail(format!(
                "Batch nesting exceeds the maximum depth of {MAX_BATCH_DEPTH}."
            )),
            results: Vec::new(),
        };
    }
    if envelopes.is_empty() {
        return BatchReport {
            summary: CommandResult::fail("Batch command list is empty."),
            results: Vec::new(),
        };
    }

    ctx.depth += 1;
    let mut results = Vec::with_capacity(envelopes.len());
    let mut halted: Option<CommandResult> = None;
    for envelope in envelopes {
        let result = dispatch::execute(ctx, envelope);
        if !result.success && break_on_error {
            halted = Some(CommandResult::fail(format!(
                "Batch execution halted due to error in command '{}': {}",
                envelope.command_type, result.message
            )));
            results.push(result);
            break;
        }
        results.push(result);
    }
    ctx.depth -= 1;

    let summary = match halted {
        Some(failure) => failure,
        None => results
            .last()
            .cloned()
            .unwrap_or_else(|| CommandResult::ok("Batch execution completed.")),
    };
    BatchReport { summary, results }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::registry::{CommandMetadata, CommandRegistry};
    use crate::scene::Scene;

    /// Registry with `Ok`/`Err` commands that count their invocations.
    fn counting_registry() -> (CommandRegistry, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let registry = CommandRegistry::new();
        let ok_count = Arc::new(AtomicUsize::new(0));
        let err_count = Arc::new(AtomicUsize::new(0));

        let ok = ok_count.clone();
        registry.register(
            CommandMetadata {
                command_type: "Ok",
                description: "Succeeds.",
                destructive: false,
                batchable: true,
                required: vec![],
                optional: vec![],
                handler_name: "Tests",
            },
            move |_, _| {
                ok.fetch_add(1, Ordering::SeqCst);
                Ok(CommandResult::ok("fine"))
            },
        );
        let err = err_count.clone();
        registry.register(
            CommandMetadata {
                command_type: "Err",
                description: "Fails.",
                destructive: false,
                batchable: true,
                required: vec![],
                optional: vec![],
                handler_name: "Tests",
            },
            move |_, _| {
                err.fetch_add(1, Ordering::SeqCst);
                Ok(CommandResult::fail("broken"))
            },
        );
        (registry, ok_count, err_count)
    }

    fn envelopes() -> Vec<CommandEnvelope> {
        vec![
            CommandEnvelope::new("Ok"),
            CommandEnvelope::new("Err"),
            CommandEnvelope::new("Ok"),
        ]
    }

    #[test]
    fn empty_batch_fails_immediately() {
        let (registry, _, _) = counting_registry();
        let mut scene = Scene::new();
        let mut ctx = ExecContext {
            scene: &mut scene,
            registry: &registry,
            depth: 0,
        };
        let report = run_batch(&mut ctx, &[], false);
        assert!(!report.summary.success);
        assert!(report.summary.message.contains("empty"));
    }

    #[test]
    fn break_on_error_skips_the_remainder() {
        let (registry, ok_count, err_count) = counting_registry();
        let mut scene = Scene::new();
        let mut ctx = ExecContext {
            scene: &mut scene,
            registry: &registry,
            depth: 0,
        };
        let report = run_batch(&mut ctx, &envelopes(), true);
        assert!(!report.summary.success);
        assert!(report.summary.message.contains("'Err'"));
        assert_eq!(report.results.len(), 2);
        assert_eq!(ok_count.load(Ordering::SeqCst), 1);
        assert_eq!(err_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn continue_on_error_runs_everything_and_keeps_each_result() {
        let (registry, ok_count, _) = counting_registry();
        let mut scene = Scene::new();
        let mut ctx = ExecContext {
            scene: &mut scene,
            registry: &registry,
            depth: 0,
        };
        let report = run_batch(&mut ctx, &envelopes(), false);
        assert_eq!(report.results.len(), 3);
        assert_eq!(ok_count.load(Ordering::SeqCst), 2);
        assert!(!report.results[1].success);
        // The third command ran and its individual result is inspectable.
        assert!(report.results[2].success);
        // Summary reflects the last result encountered.
        assert!(report.summary.success);
    }

    #[test]
    fn nesting_beyond_the_depth_guard_is_rejected() {
        let (registry, _, _) = counting_registry();
        let mut scene = Scene::new();
        let mut ctx = ExecContext {
            scene: &mut scene,
            registry: &registry,
            depth: MAX_BATCH_DEPTH,
        };
        let report = run_batch(&mut ctx, &envelopes(), false);
        assert!(!report.summary.success);
        assert!(report.summary.message.contains("depth"));
        assert!(report.results.is_empty());
    }
}
