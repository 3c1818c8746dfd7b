//! RESP Protocol Implementation
//!
//! This module implements the subset of the Redis Serialization Protocol
//! (RESP) spoken by respkv. It knows nothing about commands.
//!
//! ## Modules
//!
//! - `types`: Defines the `RespValue` enum and its serialization
//! - `parser`: Streaming decoder reading values from a buffered byte stream
//! - `writer`: Writes one serialized frame to an async stream and flushes it
//!
//! ## Example
//!
//! ```
//! use respkv::protocol::{decode, write_value, RespValue};
//!
//! # tokio_test::block_on(async {
//! // Decoding an incoming request
//! let mut input: &[u8] = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let request = decode(&mut input).await.unwrap();
//! assert_eq!(request, RespValue::request(&["GET", "name"]));
//!
//! // Writing a response
//! let mut output = Vec::new();
//! write_value(&mut output, &RespValue::bulk_string("Alice")).await.unwrap();
//! assert_eq!(output, b"$5\r\nAlice\r\n");
//! # });
//! ```

pub mod parser;
pub mod types;
pub mod writer;

// Re-export commonly used types for convenience
pub use parser::{decode, DecodeError, DecodeResult, ProtocolError, RespParser};
pub use types::RespValue;
pub use writer::write_value;
