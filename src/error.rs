//! Application-level errors
//!
//! A `CommandError` is a per-request failure. The connection handler turns it
//! into a RESP error reply and keeps the connection open, so the `Display`
//! text of each variant is exactly what the client sees on the wire.

use thiserror::Error;

/// Errors produced while interpreting a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The request is not an array of strings, or an array header declared a
    /// negative size other than the null sentinel.
    #[error("Invalid Command")]
    InvalidCommand,

    /// The verb is not in the command table.
    #[error("ERR Unknown command {0}")]
    UnknownCommand(String),

    /// The verb exists but was called with the wrong number of arguments.
    #[error("ERR Wrong number of arguments for {0}")]
    WrongArity(String),
}

/// Result type for command execution.
pub type CommandResult<T> = Result<T, CommandError>;
