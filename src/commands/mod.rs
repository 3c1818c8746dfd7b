//! Command Handler Module
//!
//! This module implements the command processing layer for respkv.
//! It receives decoded requests, executes them against the storage engine,
//! and returns a response value or a [`CommandError`](crate::error::CommandError).
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Parser    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Validate     │
//! │  - Dispatch     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PING`
//! - `GET key`
//! - `SET key value`
//! - `DELETE key`

pub mod handler;

// Re-export the main command handler
pub use handler::{Command, CommandHandler};
