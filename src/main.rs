//! respkv - A Minimal RESP Key-Value Server
//!
//! This is the main entry point for the respkv server.
//! It parses the command line, sets up logging and runs the server until Ctrl+C.

use respkv::config::{parse_args, CliCommand, ServerConfig};
use respkv::server::Server;
use respkv::storage::StorageEngine;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_help() {
    println!(
        r#"
respkv - A Minimal RESP Key-Value Server

USAGE:
    respkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>                Host to bind to (default: {host})
    -p, --port <PORT>                Port to listen on (default: {port})
    -c, --max-connections <COUNT>    Worker pool size (default: {max})
    -v, --version                    Print version information
        --help                       Print this help message

EXAMPLES:
    respkv                           # Start on {host}:{port}
    respkv --port 6380               # Start on port 6380
    respkv -c 8                      # Serve at most 8 clients at once

CONNECTING:
    Any client that sends commands as RESP arrays of bulk strings works:
    $ redis-cli -p {port}
    127.0.0.1:{port}> PING
    "PONG"
    127.0.0.1:{port}> SET name Alice
    "OK"
    127.0.0.1:{port}> GET name
    "Alice"

LOGGING:
    Set RUST_LOG to change verbosity, e.g. RUST_LOG=respkv=debug
"#,
        host = respkv::DEFAULT_HOST,
        port = respkv::DEFAULT_PORT,
        max = respkv::DEFAULT_MAX_CONNECTIONS,
    );
}

fn print_banner(config: &ServerConfig) {
    println!(
        r#"
respkv v{} - Minimal RESP Key-Value Server
──────────────────────────────────────────────────────────────
Server started on {}
Worker pool: {} connections
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        respkv::VERSION,
        config.bind_address(),
        config.max_connections,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = match parse_args(std::env::args().skip(1)) {
        Ok(CliCommand::Run(config)) => config,
        Ok(CliCommand::Help) => {
            print_help();
            return Ok(());
        }
        Ok(CliCommand::Version) => {
            println!("respkv version {}", respkv::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Create the storage engine (shared across all connections)
    let storage = Arc::new(StorageEngine::new());

    let server = Server::bind(&config, storage).await?;
    print_banner(&config);

    let handle = server.spawn()?;

    signal::ctrl_c().await?;
    info!("Ctrl+C received");

    handle.shutdown().await;
    Ok(())
}
