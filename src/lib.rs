//! # respkv - A Minimal RESP Key-Value Server
//!
//! respkv is a small, in-memory key-value server that speaks a subset of the
//! Redis Serialization Protocol (RESP) over TCP.
//!
//! ## Features
//!
//! - **RESP Codec**: Streaming decoder and encoder for the five RESP types
//! - **Four Commands**: `PING`, `GET`, `SET` and `DELETE`
//! - **Bounded Worker Pool**: At most `max_connections` sessions run at once
//! - **Async I/O**: Built on Tokio
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                               respkv                                │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐              │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │              │
//! │  │ (Semaphore) │    │  Handler    │    │  Handler    │              │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘              │
//! │                            │                  │                     │
//! │                            ▼                  ▼                     │
//! │                     ┌─────────────┐    ┌──────────────────────────┐ │
//! │                     │ RESP Parser │    │      StorageEngine       │ │
//! │                     │  / Writer   │    │ RwLock<HashMap<..>>      │ │
//! │                     └─────────────┘    └──────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use respkv::{Server, ServerConfig, StorageEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = Arc::new(StorageEngine::new());
//!     let server = Server::bind(&ServerConfig::default(), storage).await?;
//!     let handle = server.spawn()?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP values, decoder and writer
//! - [`commands`]: Command dispatch against the store
//! - [`storage`]: The shared key-value map
//! - [`connection`]: Per-client request loop
//! - [`server`]: Listener, worker pool and shutdown
//! - [`client`]: A small client for the same protocol
//! - [`config`]: Server settings and command-line parsing

pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use client::{Client, ClientError};
pub use commands::CommandHandler;
pub use config::{CliCommand, ConfigError, ServerConfig};
pub use connection::{handle_connection, ConnectionStats};
pub use error::CommandError;
pub use protocol::{DecodeError, ProtocolError, RespParser, RespValue};
pub use server::{Server, ServerError, ServerHandle};
pub use storage::StorageEngine;

/// The default port respkv listens on
pub const DEFAULT_PORT: u16 = 31337;

/// The default host respkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// The default size of the worker pool
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Version of respkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
