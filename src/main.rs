use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scenebridge::api::{self, ServerState};
use scenebridge::bridge::ApplyBridge;
use scenebridge::handlers;
use scenebridge::scene::Scene;

#[derive(Parser)]
#[command(name = "scenebridge", about = "HTTP command bridge for a live scene editor", version)]
struct Args {
    /// Address to bind the listener on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the listener on
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // The registry is fully populated before the listener binds, so every
    // routable command is known for the whole process lifetime.
    let registry = Arc::new(handlers::build_registry());
    info!("Registered {} command(s)", registry.len());

    let bridge = ApplyBridge::start(registry.clone(), Scene::new());
    let state = ServerState { bridge, registry };

    api::serve(state, &format!("{}:{}", args.host, args.port)).await
}
