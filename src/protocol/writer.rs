//! Frame writer
//!
//! Serializes a value into one buffer, writes it, then flushes. A frame is
//! never split across separate write calls, so nothing else written to the
//! same stream can land inside it.

use crate::protocol::types::RespValue;
use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Initial capacity of the serialization buffer
const INITIAL_FRAME_SIZE: usize = 64;

/// Encodes `value` onto `writer` and flushes it.
///
/// Returns the number of bytes written.
pub async fn write_value<W>(writer: &mut W, value: &RespValue) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(INITIAL_FRAME_SIZE);
    value.serialize_into(&mut buf);

    writer.write_all(&buf).await?;
    writer.flush().await?;

    Ok(buf.len())
}
