//! TCP Server
//!
//! Accepts clients and hands each one to a [`ConnectionHandler`] task.
//!
//! The worker pool is a semaphore with `max_connections` permits. A permit
//! is taken *before* `accept()`, so once the pool is full the server stops
//! accepting and further clients wait in the kernel backlog until a running
//! session ends. Nobody is rejected.
//!
//! ```text
//!   acquire permit ──> accept() ──> spawn handler (owns permit)
//!         ▲                                   │
//!         └──────── permit released on exit ──┘
//! ```
//!
//! [`ConnectionHandler`]: crate::connection::ConnectionHandler

use crate::commands::CommandHandler;
use crate::config::{ConfigError, ServerConfig};
use crate::connection::handler::wait_for_shutdown;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::StorageEngine;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Errors from starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A bound listener plus everything the accept loop hands to connections.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    limit_connections: Arc<Semaphore>,
    max_connections: usize,
}

impl Server {
    /// Validates `config` and binds the listening socket.
    pub async fn bind(
        config: &ServerConfig,
        storage: Arc<StorageEngine>,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let listener = TcpListener::bind(config.bind_address()).await?;
        info!(
            addr = %listener.local_addr()?,
            max_connections = config.max_connections,
            "Listening"
        );

        Ok(Self {
            listener,
            command_handler: CommandHandler::new(storage),
            stats: Arc::new(ConnectionStats::new()),
            limit_connections: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Runs the accept loop until `shutdown` flips to `true` (or its sender
    /// is dropped), then waits for every live session to finish.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let permit = tokio::select! {
                permit = Arc::clone(&self.limit_connections).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = wait_for_shutdown(&mut shutdown) => break,
            };

            let (stream, addr) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
                _ = wait_for_shutdown(&mut shutdown) => break,
            };

            let handler = self.command_handler.clone();
            let stats = Arc::clone(&self.stats);
            let closing = shutdown.clone();

            tokio::spawn(async move {
                handle_connection(stream, addr, handler, stats, closing).await;
                drop(permit);
            });
        }

        info!("Shutdown signal received, stopping server...");
        self.drain().await;

        let store = self.command_handler.storage().stats();
        info!(
            keys = store.keys,
            gets = store.get_ops,
            sets = store.set_ops,
            deletes = store.del_ops,
            "Server shutdown complete"
        );
    }

    /// Waits until every permit is back in the pool.
    async fn drain(&self) {
        let active = self.stats.active_connections.load(Ordering::Relaxed);
        if active > 0 {
            debug!(active, "Waiting for open connections to close");
        }

        // Bounded by `ServerConfig::validate`
        let permits = self.max_connections as u32;
        if self.limit_connections.acquire_many(permits).await.is_err() {
            warn!("Worker pool closed before drain completed");
        }
    }

    /// Runs the server on a background task.
    pub fn spawn(self) -> io::Result<ServerHandle> {
        let local_addr = self.local_addr()?;
        let stats = self.stats();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(self.run(shutdown_rx));

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            task: Some(task),
            stats,
        })
    }
}

/// A handle to a server running in the background.
///
/// Dropping the handle signals shutdown without waiting; use
/// [`ServerHandle::shutdown`] to wait for the drain to finish.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    stats: Arc<ConnectionStats>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Stops accepting, closes idle sessions and waits for the rest.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Server task failed: {}", e);
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
