//! Server configuration
//!
//! Defaults match the wire-compatible reference setup: `127.0.0.1:31337`
//! with room for 64 simultaneous connections.

use crate::{DEFAULT_HOST, DEFAULT_MAX_CONNECTIONS, DEFAULT_PORT};
use thiserror::Error;
use tokio::sync::Semaphore;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on (0 picks a free port)
    pub port: u16,
    /// Size of the worker pool
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks that the worker pool can actually be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 || self.max_connections > max_pool_size() {
            return Err(ConfigError::InvalidMaxConnections(
                self.max_connections.to_string(),
            ));
        }
        Ok(())
    }
}

/// Largest pool the server can drain in one `acquire_many` call.
fn max_pool_size() -> usize {
    Semaphore::MAX_PERMITS.min(u32::MAX as usize)
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run(ServerConfig),
    Help,
    Version,
}

/// Errors from command-line parsing and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("invalid port number: {0}")]
    InvalidPort(String),

    #[error("invalid connection limit: {0}")]
    InvalidMaxConnections(String),

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// Parses command-line arguments (without the program name).
pub fn parse_args<I>(args: I) -> Result<CliCommand, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut config = ServerConfig::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--host" | "-h" => {
                config.host = args.next().ok_or(ConfigError::MissingValue(arg))?;
            }
            "--port" | "-p" => {
                let value = args.next().ok_or_else(|| ConfigError::MissingValue(arg))?;
                config.port = value.parse().map_err(|_| ConfigError::InvalidPort(value))?;
            }
            "--max-connections" | "-c" => {
                let value = args.next().ok_or_else(|| ConfigError::MissingValue(arg))?;
                config.max_connections = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidMaxConnections(value))?;
            }
            "--help" => return Ok(CliCommand::Help),
            "--version" | "-v" => return Ok(CliCommand::Version),
            _ => return Err(ConfigError::UnknownArgument(arg)),
        }
    }

    config.validate()?;
    Ok(CliCommand::Run(config))
}
