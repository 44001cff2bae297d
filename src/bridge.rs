//! The apply-context bridge: many concurrent submitters, one apply thread.
//!
//! Network tasks call [`ApplyBridge::submit`] and await their result; a
//! dedicated OS thread (the apply context) drains the queue one command at
//! a time and runs the validate→dispatch pipeline against the scene. The
//! queue is an unbounded tokio mpsc channel: enqueue is a single atomic
//! push, so commands are applied in the order `submit` calls reach the
//! channel regardless of submitter concurrency.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::dispatch;
use crate::envelope::{CommandEnvelope, CommandResult};
use crate::registry::{CommandRegistry, ExecContext};
use crate::scene::Scene;

/// A command accepted but not yet run: the envelope plus the channel its
/// result is resolved through.
struct PendingExecution {
    envelope: CommandEnvelope,
    reply: oneshot::Sender<CommandResult>,
}

/// Handle for submitting commands to the apply context. Cloneable; all
/// clones feed the same FIFO queue.
#[derive(Clone)]
pub struct ApplyBridge {
    tx: mpsc::UnboundedSender<PendingExecution>,
}

impl ApplyBridge {
    /// Spawn the apply thread and return the submission handle. The scene
    /// moves onto the apply thread and is never touched from anywhere else.
    pub fn start(registry: Arc<CommandRegistry>, scene: Scene) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let spawned = std::thread::Builder::new()
            .name("apply-context".to_string())
            .spawn(move || drain(rx, &registry, scene));
        if let Err(e) = spawned {
            error!("Failed to spawn the apply-context thread: {e}");
        }
        Self { tx }
    }

    /// Queue an envelope for execution on the apply context and await its
    /// result. If this caller times out and drops the future, the queued
    /// command still runs to completion; only the reply goes unread.
    pub async fn submit(&self, envelope: CommandEnvelope) -> CommandResult {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(PendingExecution { envelope, reply }).is_err() {
            return CommandResult::fail("Apply context is shut down.");
        }
        rx.await
            .unwrap_or_else(|_| CommandResult::fail("Apply context dropped the command reply."))
    }
}

/// The apply-context loop. Runs each command to completion before
/// dequeuing the next; a panicking handler is converted into a failed
/// result and the loop keeps draining.
fn drain(
    mut rx: mpsc::UnboundedReceiver<PendingExecution>,
    registry: &CommandRegistry,
    mut scene: Scene,
) {
    while let Some(pending) = rx.blocking_recv() {
        debug!(command = %pending.envelope.command_type, "applying command");
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = ExecContext {
                scene: &mut scene,
                registry,
                depth: 0,
            };
            dispatch::execute(&mut ctx, &pending.envelope)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(
                command = %pending.envelope.command_type,
                "command handler panicked: {message}"
            );
            CommandResult::fail(format!("Command handler panicked: {message}"))
                .for_command(&pending.envelope.command_type)
        });
        // An abandoned caller is fire-and-forget: the send fails, the
        // command has already been applied.
        let _ = pending.reply.send(result);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::registry::CommandMetadata;

    fn metadata(command_type: &'static str) -> CommandMetadata {
        CommandMetadata {
            command_type,
            description: "test command",
            destructive: false,
            batchable: true,
            required: vec![],
            optional: vec![],
            handler_name: "Tests",
        }
    }

    #[tokio::test]
    async fn commands_apply_in_submit_order() {
        let registry = CommandRegistry::new();
        let order: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = order.clone();
        registry.register(metadata("Record"), move |_, envelope| {
            let tag = envelope.i64_field("tag").unwrap_or(-1);
            seen.lock().unwrap().push(tag);
            Ok(CommandResult::ok(format!("recorded {tag}")))
        });

        let bridge = ApplyBridge::start(Arc::new(registry), Scene::new());

        // Submit from one task in a controlled order, awaiting nothing in
        // between, then await all results. FIFO order must match.
        let mut futures = Vec::new();
        for tag in 0..32_i64 {
            let envelope = CommandEnvelope::new("Record").with_field("tag", tag.into());
            futures.push(bridge.submit(envelope));
        }
        for future in futures {
            assert!(future.await.success);
        }
        let recorded = order.lock().unwrap().clone();
        assert_eq!(recorded, (0..32).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn concurrent_submitters_all_get_their_own_result() {
        let registry = CommandRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        registry.register(metadata("Count"), move |_, envelope| {
            c.fetch_add(1, Ordering::SeqCst);
            let tag = envelope.i64_field("tag").unwrap_or(-1);
            Ok(CommandResult::ok(format!("ran {tag}")))
        });

        let bridge = ApplyBridge::start(Arc::new(registry), Scene::new());
        let mut handles = Vec::new();
        for tag in 0..16_i64 {
            let bridge = bridge.clone();
            handles.push(tokio::spawn(async move {
                let envelope = CommandEnvelope::new("Count").with_field("tag", tag.into());
                (tag, bridge.submit(envelope).await)
            }));
        }
        for handle in handles {
            let (tag, result) = handle.await.unwrap();
            assert!(result.success);
            assert_eq!(result.message, format!("ran {tag}"));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[tokio::test]
    async fn a_panicking_handler_does_not_poison_the_bridge() {
        let registry = CommandRegistry::new();
        registry.register(metadata("Explode"), |_, _| panic!("boom"));
        registry.register(metadata("Ping"), |_, _| Ok(CommandResult::ok("pong")));

        let bridge = ApplyBridge::start(Arc::new(registry), Scene::new());

        let exploded = bridge.submit(CommandEnvelope::new("Explode")).await;
        assert!(!exploded.success);
        assert!(exploded.message.contains("panicked"));
        assert!(exploded.message.contains("boom"));

        // The queue keeps draining after the panic.
        let pong = bridge.submit(CommandEnvelope::new("Ping")).await;
        assert!(pong.success);
    }

    #[tokio::test]
    async fn scene_mutations_are_serialized() {
        let registry = CommandRegistry::new();
        registry.register(metadata("AddNode"), |ctx, envelope| {
            let name = envelope.str_field("name").unwrap_or_default().to_string();
            ctx.scene.create_node(&name, None)?;
            Ok(CommandResult::ok(format!("created {name}")).with_output(
                ctx.scene.len().to_string(),
            ))
        });

        let bridge = ApplyBridge::start(Arc::new(registry), Scene::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let bridge = bridge.clone();
            handles.push(tokio::spawn(async move {
                bridge
                    .submit(
                        CommandEnvelope::new("AddNode")
                            .with_field("name", format!("node-{i}").into()),
                    )
                    .await
            }));
        }
        let mut sizes = Vec::new();
        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.success);
            sizes.push(result.output.unwrap().parse::<usize>().unwrap());
        }
        // Every command saw a distinct scene size: no interleaving.
        sizes.sort_unstable();
        assert_eq!(sizes, (1..=8).collect::<Vec<usize>>());
    }
}
