//! Connection Handler Module
//!
//! This module handles individual client connections to respkv.
//! Each client gets its own handler task that runs in a loop,
//! reading requests and sending responses.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! Connected
//!     │
//!     ▼
//! AwaitingRequest ──── Disconnect / ProtocolError / shutdown ───> Closed
//!     │
//!     ▼
//! Dispatching ──── CommandError becomes an error reply ───┐
//!     │                                                    │
//!     ▼                                                    │
//! Responding <─────────────────────────────────────────────┘
//!     │
//!     └──> AwaitingRequest
//! ```
//!
//! Requests on one connection are handled strictly in order: one decode,
//! one dispatch, one fully flushed response. The shutdown signal is only
//! observed while waiting for a request, so a response is never cut off
//! part way through its frame.

use crate::commands::CommandHandler;
use crate::protocol::{write_value, DecodeError, ProtocolError, RespParser, RespValue};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufStream};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total requests answered, including error replies
    pub commands_processed: AtomicU64,
    /// Requests answered with an error reply
    pub command_errors: AtomicU64,
    /// Connections closed because of malformed framing
    pub protocol_errors: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_failed(&self) {
        self.command_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
///
/// Generic over the transport so the loop can run on a `TcpStream` in the
/// server and on in-memory streams in tests.
pub struct ConnectionHandler<S> {
    /// The buffered read/write stream for this connection
    stream: BufStream<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// The command handler (shares the store with every other connection)
    command_handler: CommandHandler,

    /// RESP parser
    parser: RespParser,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,

    /// Flips to `true` when the server shuts down
    shutdown: watch::Receiver<bool>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The transport for this connection
    /// * `addr` - The client's socket address
    /// * `command_handler` - The command handler for executing requests
    /// * `stats` - Shared connection statistics
    /// * `shutdown` - Server shutdown signal
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufStream::new(stream),
            addr,
            command_handler,
            parser: RespParser::new(),
            stats,
            shutdown,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Returns `Ok(())` when the peer disconnects or the server shuts down,
    /// and an error when the connection had to be torn down.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => debug!(client = %self.addr, "Client disconnected"),
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection closed on error"),
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let decoded = tokio::select! {
                decoded = self.parser.parse(&mut self.stream) => decoded,
                _ = wait_for_shutdown(&mut self.shutdown) => {
                    debug!(client = %self.addr, "Closing connection for shutdown");
                    return Ok(());
                }
            };

            let response = match decoded {
                Ok(request) => {
                    trace!(client = %self.addr, request = ?request, "Received request");
                    match self.command_handler.execute(request) {
                        Ok(response) => response,
                        Err(e) => {
                            self.stats.command_failed();
                            debug!(client = %self.addr, error = %e, "Command rejected");
                            RespValue::error(e.to_string())
                        }
                    }
                }
                Err(DecodeError::Disconnect) => return Ok(()),
                Err(DecodeError::Command(e)) => {
                    self.stats.command_failed();
                    debug!(client = %self.addr, error = %e, "Request rejected while decoding");
                    RespValue::error(e.to_string())
                }
                Err(DecodeError::Protocol(e)) => {
                    self.stats.protocol_error();
                    return Err(ConnectionError::ProtocolError(e));
                }
                Err(DecodeError::Io(e)) => return Err(ConnectionError::IoError(e)),
            };

            self.stats.command_processed();
            self.send_response(&response).await?;
        }
    }

    /// Sends a response to the client.
    async fn send_response(&mut self, response: &RespValue) -> Result<(), ConnectionError> {
        let written = write_value(&mut self.stream, response).await?;
        self.stats.bytes_written(written);
        trace!(
            client = %self.addr,
            bytes = written,
            "Sent response"
        );
        Ok(())
    }
}

/// Resolves once shutdown is signalled or the signalling side is gone.
pub(crate) async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed RESP framing
    #[error("Protocol error: {0}")]
    ProtocolError(#[from] ProtocolError),
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion. Failures are logged by the handler and go
/// no further: one broken connection never affects another.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    shutdown: watch::Receiver<bool>,
) {
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats, shutdown);
    if handler.run().await.is_err() {
        trace!(client = %addr, "Connection task finished after error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageEngine;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio_test::io::Builder;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn create_handler<S>(
        stream: S,
        stats: &Arc<ConnectionStats>,
        shutdown: watch::Receiver<bool>,
    ) -> ConnectionHandler<S>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let commands = CommandHandler::new(Arc::new(StorageEngine::new()));
        ConnectionHandler::new(stream, test_addr(), commands, Arc::clone(stats), shutdown)
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let stream = Builder::new()
            .read(b"*1\r\n$4\r\nPING\r\n")
            .write(b"$4\r\nPONG\r\n")
            .build();
        let stats = Arc::new(ConnectionStats::new());
        let (_tx, rx) = watch::channel(false);

        create_handler(stream, &stats, rx).run().await.unwrap();

        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 10);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_set_get_delete_sequence() {
        let stream = Builder::new()
            .read(b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$5\r\nAlice\r\n")
            .write(b"$2\r\nOK\r\n")
            .read(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
            .write(b"$5\r\nAlice\r\n")
            .read(b"*2\r\n$6\r\nDELETE\r\n$4\r\nname\r\n")
            .write(b":1\r\n")
            .read(b"*2\r\n$3\r\nget\r\n$4\r\nname\r\n")
            .write(b"$-1\r\n")
            .build();
        let stats = Arc::new(ConnectionStats::new());
        let (_tx, rx) = watch::channel(false);

        create_handler(stream, &stats, rx).run().await.unwrap();

        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn test_command_error_keeps_connection_open() {
        let stream = Builder::new()
            .read(b"*1\r\n$3\r\nFOO\r\n")
            .write(b"-ERR Unknown command FOO\r\n")
            .read(b"*2\r\n$3\r\nSET\r\n$1\r\nk\r\n")
            .write(b"-ERR Wrong number of arguments for SET\r\n")
            .read(b"*1\r\n$4\r\nPING\r\n")
            .write(b"$4\r\nPONG\r\n")
            .build();
        let stats = Arc::new(ConnectionStats::new());
        let (_tx, rx) = watch::channel(false);

        create_handler(stream, &stats, rx).run().await.unwrap();

        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 3);
        assert_eq!(stats.command_errors.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_invalid_array_size_is_answered() {
        let stream = Builder::new()
            .read(b"*-2\r\n")
            .write(b"-Invalid Command\r\n")
            .read(b"*1\r\n$4\r\nPING\r\n")
            .write(b"$4\r\nPONG\r\n")
            .build();
        let stats = Arc::new(ConnectionStats::new());
        let (_tx, rx) = watch::channel(false);

        create_handler(stream, &stats, rx).run().await.unwrap();

        assert_eq!(stats.command_errors.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_protocol_error_closes_without_reply() {
        let stream = Builder::new().read(b"?garbage\r\n").build();
        let stats = Arc::new(ConnectionStats::new());
        let (_tx, rx) = watch::channel(false);

        let result = create_handler(stream, &stats, rx).run().await;

        assert!(matches!(
            result,
            Err(ConnectionError::ProtocolError(ProtocolError::UnknownPrefix(b'?')))
        ));
        assert_eq!(stats.protocol_errors.load(Ordering::Relaxed), 1);
        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 0);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_pipelined_requests() {
        let stream = Builder::new()
            .read(b"*3\r\n$3\r\nSET\r\n$2\r\nk1\r\n$2\r\nv1\r\n*2\r\n$3\r\nGET\r\n$2\r\nk1\r\n")
            .write(b"$2\r\nOK\r\n")
            .write(b"$2\r\nv1\r\n")
            .build();
        let stats = Arc::new(ConnectionStats::new());
        let (_tx, rx) = watch::channel(false);

        create_handler(stream, &stats, rx).run().await.unwrap();

        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_connection() {
        let (mut client, server) = tokio::io::duplex(1024);
        let stats = Arc::new(ConnectionStats::new());
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(create_handler(server, &stats, rx).run());

        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        let mut buf = [0u8; 10];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"$4\r\nPONG\r\n");

        tx.send(true).unwrap();
        task.await.unwrap().unwrap();

        // The server side is gone, so the client sees end of stream
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_shutdown_mid_response_sends_whole_frame() {
        let (mut client, server) = tokio::io::duplex(64);
        let stats = Arc::new(ConnectionStats::new());
        let (tx, rx) = watch::channel(false);

        let storage = Arc::new(StorageEngine::new());
        let value = "v".repeat(100_000);
        storage.set("k".to_string(), value.clone());
        let handler = ConnectionHandler::new(
            server,
            test_addr(),
            CommandHandler::new(storage),
            Arc::clone(&stats),
            rx,
        );
        let task = tokio::spawn(handler.run());

        client.write_all(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n").await.unwrap();

        // The reply has started once its first bytes arrive
        let mut head = [0u8; 8];
        client.read_exact(&mut head).await.unwrap();
        tx.send(true).unwrap();

        let mut received = head.to_vec();
        client.read_to_end(&mut received).await.unwrap();
        task.await.unwrap().unwrap();

        let expected = format!("$100000\r\n{}\r\n", value);
        assert_eq!(received.len(), expected.len());
        assert!(received == expected.as_bytes());
        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 1);
    }
}
