//! Streaming RESP Protocol Parser
//!
//! This module decodes RESP values directly from a buffered byte stream.
//! Instead of accumulating bytes and retrying a parse, the parser pulls
//! exactly the bytes each frame needs and suspends only while waiting on I/O.
//!
//! ## Outcomes
//!
//! Every call to [`RespParser::parse`] ends in one of:
//! - `Ok(value)` - a complete value was read
//! - `Err(DecodeError::Disconnect)` - the stream ended where a new value
//!   should start; the peer closed the connection
//! - `Err(DecodeError::Command(_))` - an array header declared a size below
//!   `-1`; the request is rejected but the stream is still usable
//! - `Err(DecodeError::Protocol(_))` - the framing is broken; the stream
//!   cannot be resynchronised and must be closed
//! - `Err(DecodeError::Io(_))` - the underlying transport failed
//!
//! ## Line Terminators
//!
//! Line types end at the first CR that is immediately followed by LF. A CR
//! followed by anything else is kept as content together with the byte after
//! it, and that byte is never re-examined as the start of a terminator:
//! `+a\r\r\nb\r\n` decodes to `"a\r\r\nb"`.

use crate::error::CommandError;
use crate::protocol::types::{prefix, RespValue};
use std::future::Future;
use std::io;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncReadExt};

/// Errors caused by malformed wire framing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Unknown type prefix byte
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// A line that should hold a base-10 integer doesn't
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),

    /// Text content is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// The stream ended before a bulk string's declared length was read
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// The stream ended in the middle of a line
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// A line or bulk string exceeds the allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Arrays are nested too deeply
    #[error("maximum nesting depth exceeded: {0}")]
    NestingTooDeep(usize),
}

/// Everything that can end a decode call other than a value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The peer closed the stream before the first byte of a value.
    #[error("peer disconnected")]
    Disconnect,

    /// Recoverable, request-level rejection.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Fatal framing error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum size for a single line-terminated value (64 KB)
pub const MAX_LINE_SIZE: usize = 64 * 1024;

/// Maximum array nesting depth (prevent stack overflow)
pub const MAX_NESTING_DEPTH: usize = 32;

/// Upper bound on capacity reserved up front from a declared length
const PREALLOC_LIMIT: usize = 4096;

type DecodeFuture<'a> = Pin<Box<dyn Future<Output = DecodeResult<RespValue>> + Send + 'a>>;

/// A streaming RESP parser.
///
/// The reader should be buffered (`BufReader`, `BufStream`, or an in-memory
/// slice): the parser reads line-terminated values one byte at a time.
///
/// # Example
///
/// ```
/// use respkv::protocol::{RespParser, RespValue};
///
/// # tokio_test::block_on(async {
/// let mut input: &[u8] = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
/// let mut parser = RespParser::new();
/// let value = parser.parse(&mut input).await.unwrap();
/// assert_eq!(value, RespValue::request(&["GET", "name"]));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct RespParser {
    /// Current nesting depth (for array parsing)
    depth: usize,
}

impl RespParser {
    /// Creates a new parser instance.
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Reads one complete value from `reader`.
    pub async fn parse<R>(&mut self, reader: &mut R) -> DecodeResult<RespValue>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        self.depth = 0;
        self.parse_value(reader).await
    }

    /// Internal recursive parsing function.
    fn parse_value<'a, R>(&'a mut self, reader: &'a mut R) -> DecodeFuture<'a>
    where
        R: AsyncBufRead + Unpin + Send + 'a,
    {
        Box::pin(async move {
            let Some(type_byte) = read_prefix(reader).await? else {
                return Err(DecodeError::Disconnect);
            };

            match type_byte {
                prefix::SIMPLE_STRING => Ok(RespValue::SimpleString(read_line(reader).await?)),
                prefix::ERROR => Ok(RespValue::Error(read_line(reader).await?)),
                prefix::INTEGER => Ok(RespValue::Integer(read_integer(reader).await?)),
                prefix::BULK_STRING => read_bulk_string(reader).await,
                prefix::ARRAY => self.parse_array(reader).await,
                other => Err(ProtocolError::UnknownPrefix(other).into()),
            }
        })
    }

    /// Parses an array: `*<count>\r\n<elements...>`
    async fn parse_array<R>(&mut self, reader: &mut R) -> DecodeResult<RespValue>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let count = read_integer(reader).await?;

        if count == -1 {
            return Ok(RespValue::Null);
        }
        if count < 0 {
            return Err(CommandError::InvalidCommand.into());
        }
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ProtocolError::NestingTooDeep(MAX_NESTING_DEPTH).into());
        }

        let count = count as u64;
        let mut elements = Vec::with_capacity((count as usize).min(PREALLOC_LIMIT));

        self.depth += 1;
        for _ in 0..count {
            elements.push(self.parse_value(reader).await?);
        }
        self.depth -= 1;

        Ok(RespValue::Array(elements))
    }
}

/// Reads the type prefix. `None` means the stream is closed.
async fn read_prefix<R>(reader: &mut R) -> DecodeResult<Option<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut byte = [0u8; 1];
    let n = reader.read(&mut byte).await?;
    Ok((n == 1).then_some(byte[0]))
}

/// Reads one byte inside a frame, where end of stream is a framing error.
async fn next_byte<R>(reader: &mut R) -> DecodeResult<u8>
where
    R: AsyncBufRead + Unpin,
{
    match reader.read_u8().await {
        Ok(byte) => Ok(byte),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(ProtocolError::UnexpectedEof.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Reads a CRLF-terminated line, without the terminator.
async fn read_line<R>(reader: &mut R) -> DecodeResult<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();

    loop {
        match next_byte(reader).await? {
            b'\r' => {
                let next = next_byte(reader).await?;
                if next == b'\n' {
                    break;
                }
                line.push(b'\r');
                line.push(next);
            }
            byte => line.push(byte),
        }

        if line.len() > MAX_LINE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: line.len(),
                max: MAX_LINE_SIZE,
            }
            .into());
        }
    }

    String::from_utf8(line).map_err(|e| ProtocolError::InvalidUtf8(e.to_string()).into())
}

/// Reads a line and parses it as a signed base-10 integer.
async fn read_integer<R>(reader: &mut R) -> DecodeResult<i64>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader).await?;
    Ok(parse_integer(&line)?)
}

/// Parses `[-]digits`. Unlike `str::parse`, a leading `+` is rejected.
fn parse_integer(line: &str) -> Result<i64, ProtocolError> {
    let digits = line.strip_prefix('-').unwrap_or(line);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::InvalidInteger(line.to_string()));
    }
    line.parse()
        .map_err(|_| ProtocolError::InvalidInteger(line.to_string()))
}

/// Parses a bulk string body after its `$` prefix: `<length>\r\n<data>\r\n`
async fn read_bulk_string<R>(reader: &mut R) -> DecodeResult<RespValue>
where
    R: AsyncBufRead + Unpin,
{
    let length = read_integer(reader).await?;

    // Handle null bulk string
    if length == -1 {
        return Ok(RespValue::Null);
    }
    if length < 0 {
        return Err(ProtocolError::InvalidBulkLength(length).into());
    }

    let length = length as u64;
    if length > MAX_BULK_SIZE as u64 {
        return Err(ProtocolError::MessageTooLarge {
            size: usize::try_from(length).unwrap_or(usize::MAX),
            max: MAX_BULK_SIZE,
        }
        .into());
    }
    let length = length as usize;

    let mut data = Vec::with_capacity(length.min(PREALLOC_LIMIT));
    let actual = (&mut *reader)
        .take(length as u64)
        .read_to_end(&mut data)
        .await?;
    if actual < length {
        return Err(ProtocolError::ShortRead {
            expected: length,
            actual,
        }
        .into());
    }

    // The two bytes after the payload are the terminator; they are skipped,
    // not checked.
    let mut terminator = Vec::with_capacity(2);
    (&mut *reader).take(2).read_to_end(&mut terminator).await?;

    String::from_utf8(data)
        .map(RespValue::BulkString)
        .map_err(|e| ProtocolError::InvalidUtf8(e.to_string()).into())
}

/// Decodes a single value with a fresh parser.
///
/// This is a convenience function for simple use cases.
pub async fn decode<R>(reader: &mut R) -> DecodeResult<RespValue>
where
    R: AsyncBufRead + Unpin + Send,
{
    RespParser::new().parse(reader).await
}
