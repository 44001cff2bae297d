// CLI binary — panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::process;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "scenebridge-cli", about = "Client for a running scenebridge server", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the server
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Post a command payload. Pass JSON inline, or @path to read a file.
    Exec { payload: String },
    /// Fetch the machine-readable command schema
    Schema,
}

fn read_payload(arg: &str) -> String {
    if let Some(path) = arg.strip_prefix('@') {
        std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Cannot read '{path}': {e}");
            process::exit(1);
        })
    } else {
        arg.to_string()
    }
}

fn main() {
    let cli = Cli::parse();
    let client = reqwest::blocking::Client::new();

    match cli.command {
        Commands::Exec { payload } => {
            let body = read_payload(&payload);
            let response = client
                .post(format!("{}/executeCommand/", cli.url))
                .header("Content-Type", "application/json")
                .body(body)
                .send()
                .unwrap_or_else(|e| {
                    eprintln!("Request failed: {e}");
                    process::exit(1);
                });
            let result: Value = response.json().expect("server returned invalid JSON");
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
            if result["success"] != Value::Bool(true) {
                process::exit(1);
            }
        }
        Commands::Schema => {
            let response = client
                .get(format!("{}/schema/", cli.url))
                .send()
                .unwrap_or_else(|e| {
                    eprintln!("Request failed: {e}");
                    process::exit(1);
                });
            let schema: Value = response.json().expect("server returned invalid JSON");
            println!("{}", serde_json::to_string_pretty(&schema).unwrap());
        }
    }
}
