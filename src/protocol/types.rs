//! RESP (Redis Serialization Protocol) Data Types
//!
//! This module defines the value model shared by requests and responses.
//!
//! ## Protocol Format
//!
//! Each RESP type starts with a type prefix byte:
//! - `+` Simple String
//! - `-` Error
//! - `:` Integer
//! - `$` Bulk String
//! - `*` Array
//!
//! Line types and headers are terminated with CRLF (`\r\n`).
//!
//! ## Encoding
//!
//! The encoder is deliberately narrower than the decoder: every piece of text,
//! whether it arrived as a simple string or a bulk string, is written with
//! bulk-string framing, and both null forms are written as `$-1\r\n`.
//!
//! | Value | Wire form |
//! |---|---|
//! | `Integer(42)` | `:42\r\n` |
//! | `BulkString("foo")` | `$3\r\nfoo\r\n` |
//! | `SimpleString("OK")` | `$2\r\nOK\r\n` |
//! | `Null` | `$-1\r\n` |
//! | `Array([])` | `*0\r\n` |
//! | `Error("ERR x")` | `-ERR x\r\n` |

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// Represents a value in the RESP protocol.
///
/// `Null` stands for both the null bulk string (`$-1`) and the null array
/// (`*-1`); the two are indistinguishable once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Line-terminated text. Format: `+<string>\r\n`
    SimpleString(String),

    /// Error message. Format: `-<error message>\r\n`
    Error(String),

    /// 64-bit signed integer. Format: `:<integer>\r\n`
    Integer(i64),

    /// Length-prefixed UTF-8 text. Format: `$<length>\r\n<data>\r\n`
    BulkString(String),

    /// Null bulk string or null array.
    Null,

    /// Ordered sequence of values, possibly nested.
    /// Format: `*<count>\r\n<element1><element2>...`
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Creates a new simple string value.
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Creates a new error value.
    ///
    /// # Example
    /// ```
    /// use respkv::protocol::RespValue;
    /// let err = RespValue::error("ERR Unknown command FOO");
    /// assert!(err.is_error());
    /// ```
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Creates a new integer value.
    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a new bulk string value.
    ///
    /// # Example
    /// ```
    /// use respkv::protocol::RespValue;
    /// let bulk = RespValue::bulk_string("hello");
    /// assert_eq!(&bulk.serialize()[..], b"$5\r\nhello\r\n");
    /// ```
    pub fn bulk_string(s: impl Into<String>) -> Self {
        RespValue::BulkString(s.into())
    }

    /// Creates a null value.
    pub fn null() -> Self {
        RespValue::Null
    }

    /// Creates an array value.
    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    /// Builds a request array of bulk strings, `[VERB, arg...]`.
    pub fn request<S: AsRef<str>>(parts: &[S]) -> Self {
        RespValue::Array(
            parts
                .iter()
                .map(|p| RespValue::BulkString(p.as_ref().to_string()))
                .collect(),
        )
    }

    /// Serializes the value into a new buffer.
    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.serialize_into(&mut buf);
        buf.freeze()
    }

    /// Serializes the value into an existing buffer.
    ///
    /// Array elements are written recursively in order, so a whole frame
    /// always lands in `buf` before anything reaches the socket.
    pub fn serialize_into(&self, buf: &mut BytesMut) {
        match self {
            RespValue::Integer(n) => {
                buf.put_u8(prefix::INTEGER);
                buf.put_slice(n.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::SimpleString(s) | RespValue::BulkString(s) => {
                buf.put_u8(prefix::BULK_STRING);
                buf.put_slice(s.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Null => {
                buf.put_u8(prefix::BULK_STRING);
                buf.put_slice(b"-1");
                buf.put_slice(CRLF);
            }
            RespValue::Array(values) => {
                buf.put_u8(prefix::ARRAY);
                buf.put_slice(values.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                for value in values {
                    value.serialize_into(buf);
                }
            }
            RespValue::Error(message) => {
                buf.put_u8(prefix::ERROR);
                buf.put_slice(message.as_bytes());
                buf.put_slice(CRLF);
            }
        }
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::Null)
    }

    /// Returns true if this value is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Returns the text of a simple or bulk string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) | RespValue::BulkString(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract the inner integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RespValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Consumes self and returns the inner array if this is an Array variant.
    pub fn into_array(self) -> Option<Vec<RespValue>> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) | RespValue::BulkString(s) => write!(f, "\"{}\"", s),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::Null => write!(f, "(nil)"),
            RespValue::Array(values) => {
                if values.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    for (i, v) in values.iter().enumerate() {
                        if i > 0 {
                            writeln!(f)?;
                        }
                        write!(f, "{}) {}", i + 1, v)?;
                    }
                    Ok(())
                }
            }
        }
    }
}
