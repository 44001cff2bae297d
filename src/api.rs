//! The HTTP surface of the bridge.
//!
//! Two routes: `POST /executeCommand/` accepts either a single command
//! envelope or a JSON array of envelopes, and `GET /schema/` serves the
//! machine-readable command catalog. Every execution outcome, including
//! malformed JSON, is reported as HTTP 200 with `success` in the body;
//! clients distinguish failures by inspecting the result, not the status.

use std::sync::Arc;

use axum::extract::Extension;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::bridge::ApplyBridge;
use crate::envelope::{CommandEnvelope, CommandResult};
use crate::registry::{catalog, CommandRegistry};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct ServerState {
    pub bridge: ApplyBridge,
    pub registry: Arc<CommandRegistry>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/executeCommand/", post(execute_command))
        .route("/schema/", get(schema))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

/// Bind and serve until the process exits.
pub async fn serve(state: ServerState, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, router(state)).await
}

async fn schema(Extension(state): Extension<ServerState>) -> Json<Value> {
    Json(catalog::to_json_schema(&state.registry))
}

async fn execute_command(
    Extension(state): Extension<ServerState>,
    body: String,
) -> Json<CommandResult> {
    Json(handle_payload(&state, &body).await)
}

/// Decode and run a raw request body. A leading `[` selects array mode:
/// each element is submitted in order and the first failure halts the rest,
/// matching the fail-fast contract LLM clients rely on when they send a
/// dependent command sequence as a top-level array.
pub async fn handle_payload(state: &ServerState, raw: &str) -> CommandResult {
    if raw.trim_start().starts_with('[') {
        match serde_json::from_str::<Vec<CommandEnvelope>>(raw) {
            Ok(envelopes) => run_sequence(state, envelopes).await,
            Err(e) => deserialization_failure(&e, raw),
        }
    } else {
        match serde_json::from_str::<CommandEnvelope>(raw) {
            Ok(envelope) => {
                debug!(command = %envelope.command_type, "received command");
                state.bridge.submit(envelope).await
            }
            Err(e) => deserialization_failure(&e, raw),
        }
    }
}

async fn run_sequence(state: &ServerState, envelopes: Vec<CommandEnvelope>) -> CommandResult {
    if envelopes.is_empty() {
        return CommandResult::fail("Command array is empty.");
    }
    let mut last = CommandResult::ok("No commands executed.");
    for envelope in envelopes {
        let command_type = envelope.command_type.clone();
        let result = state.bridge.submit(envelope).await;
        if !result.success {
            return CommandResult::fail(format!(
                "Batch execution halted due to error in command '{command_type}': {}",
                result.message
            ));
        }
        last = result;
    }
    last
}

fn deserialization_failure(e: &serde_json::Error, raw: &str) -> CommandResult {
    CommandResult::fail(format!("JSON deserialization error: {e}, payload: {raw}"))
}
