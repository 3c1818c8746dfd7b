//! Client
//!
//! A small async client for the server: it frames each call as an array of
//! bulk strings and reads back exactly one response value.
//!
//! # Example
//!
//! ```ignore
//! use respkv::client::Client;
//!
//! let mut client = Client::connect("127.0.0.1:31337").await?;
//! client.execute(&["SET", "name", "Alice"]).await?;
//! let name = client.execute(&["GET", "name"]).await?;
//! client.disconnect().await?;
//! ```

use crate::protocol::{write_value, DecodeError, RespParser, RespValue};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Errors returned by [`Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server closed the connection before replying
    #[error("server closed the connection")]
    Disconnected,

    /// The server's reply could not be decoded
    #[error("invalid reply: {0}")]
    InvalidReply(#[source] DecodeError),
}

impl From<DecodeError> for ClientError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Disconnect => ClientError::Disconnected,
            DecodeError::Io(e) => ClientError::Io(e),
            other => ClientError::InvalidReply(other),
        }
    }
}

/// A connection to a respkv server.
#[derive(Debug)]
pub struct Client {
    stream: BufStream<TcpStream>,
    parser: RespParser,
}

impl Client {
    /// Opens a connection to the server at `addr`.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream: BufStream::new(stream),
            parser: RespParser::new(),
        })
    }

    /// Sends `[VERB, arg...]` and waits for the reply.
    ///
    /// Error replies from the server come back as `Ok(RespValue::Error(_))`;
    /// `Err` is reserved for transport and framing failures.
    pub async fn execute<S: AsRef<str>>(&mut self, args: &[S]) -> Result<RespValue, ClientError> {
        let request = RespValue::request(args);
        write_value(&mut self.stream, &request).await?;

        Ok(self.parser.parse(&mut self.stream).await?)
    }

    /// Closes the write side of the connection.
    pub async fn disconnect(mut self) -> Result<(), ClientError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_execute_frames_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let expected = b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$5\r\nAlice\r\n";
            let mut buf = vec![0u8; expected.len()];
            socket.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf[..], &expected[..]);
            socket.write_all(b"$2\r\nOK\r\n").await.unwrap();
        });

        let mut client = Client::connect(addr).await.unwrap();
        let reply = client.execute(&["SET", "name", "Alice"]).await.unwrap();
        assert_eq!(reply, RespValue::bulk_string("OK"));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_server_close_is_disconnected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 14];
            socket.read_exact(&mut buf).await.unwrap();
            // Close without replying
        });

        let mut client = Client::connect(addr).await.unwrap();
        let result = client.execute(&["PING"]).await;
        server.await.unwrap();

        assert!(matches!(
            result,
            Err(ClientError::Disconnected) | Err(ClientError::Io(_))
        ));
    }
}
