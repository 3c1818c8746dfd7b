//! Storage Engine Module
//!
//! This module provides the key-value map shared by all client connections.
//! It is mutated only through the command dispatcher and lives as long as
//! the server process. There is no persistence and no expiry.
//!
//! ## Example
//!
//! ```
//! use respkv::storage::StorageEngine;
//! use std::sync::Arc;
//!
//! let engine = Arc::new(StorageEngine::new());
//! engine.set("name".to_string(), "Alice".to_string());
//! assert_eq!(engine.get("name"), Some("Alice".to_string()));
//! ```

pub mod engine;

// Re-export commonly used types
pub use engine::{StorageEngine, StorageStats};
