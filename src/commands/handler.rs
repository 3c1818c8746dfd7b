//! Command Handler Module
//!
//! This module turns a decoded request into a response. A request is an
//! array of strings whose first element is the verb; the verb is matched
//! case-insensitively against a fixed table and the remaining elements are
//! checked against the command's exact arity.
//!
//! ## Supported Commands
//!
//! | Command | Arguments | Result |
//! |---|---|---|
//! | `PING` | none | `"PONG"` |
//! | `GET key` | 1 | stored value, or null |
//! | `SET key value` | 2 | `"OK"` |
//! | `DELETE key` | 1 | `1` if the key existed, else `0` |
//!
//! Failures come back as [`CommandError`] values. Nothing in this module
//! writes to the wire; the connection handler decides how to report them.

use crate::error::{CommandError, CommandResult};
use crate::protocol::RespValue;
use crate::storage::StorageEngine;
use std::sync::Arc;

/// The fixed command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Get,
    Set,
    Delete,
}

impl Command {
    /// Looks up an uppercased verb.
    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "PING" => Some(Command::Ping),
            "GET" => Some(Command::Get),
            "SET" => Some(Command::Set),
            "DELETE" => Some(Command::Delete),
            _ => None,
        }
    }

    /// Number of arguments the command takes, excluding the verb.
    pub fn arity(self) -> usize {
        match self {
            Command::Ping => 0,
            Command::Get | Command::Delete => 1,
            Command::Set => 2,
        }
    }

    /// The canonical verb.
    pub fn name(self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Get => "GET",
            Command::Set => "SET",
            Command::Delete => "DELETE",
        }
    }
}

/// Executes requests against the shared storage engine.
///
/// Cloning is cheap; every clone points at the same store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
}

impl CommandHandler {
    /// Creates a new command handler with the given storage engine.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    /// Returns the storage engine this handler operates on.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    /// Executes a request and returns the response value.
    ///
    /// # Arguments
    ///
    /// * `request` - The decoded request; must be an array of strings
    ///
    /// # Example
    ///
    /// ```
    /// use respkv::commands::CommandHandler;
    /// use respkv::protocol::RespValue;
    /// use respkv::storage::StorageEngine;
    /// use std::sync::Arc;
    ///
    /// let handler = CommandHandler::new(Arc::new(StorageEngine::new()));
    /// let reply = handler.execute(RespValue::request(&["ping"])).unwrap();
    /// assert_eq!(reply, RespValue::bulk_string("PONG"));
    /// ```
    pub fn execute(&self, request: RespValue) -> CommandResult<RespValue> {
        let args = parse_request(request)?;
        let (verb, args) = args.split_first().ok_or(CommandError::InvalidCommand)?;

        let verb = verb.to_uppercase();
        let command =
            Command::from_verb(&verb).ok_or_else(|| CommandError::UnknownCommand(verb.clone()))?;

        if args.len() != command.arity() {
            return Err(CommandError::WrongArity(verb));
        }

        Ok(self.dispatch(command, args))
    }

    /// Runs a command whose arity has already been checked.
    fn dispatch(&self, command: Command, args: &[String]) -> RespValue {
        match command {
            Command::Ping => RespValue::bulk_string("PONG"),
            Command::Get => self.cmd_get(&args[0]),
            Command::Set => self.cmd_set(&args[0], &args[1]),
            Command::Delete => self.cmd_delete(&args[0]),
        }
    }

    /// GET key
    fn cmd_get(&self, key: &str) -> RespValue {
        match self.storage.get(key) {
            Some(value) => RespValue::BulkString(value),
            None => RespValue::Null,
        }
    }

    /// SET key value
    fn cmd_set(&self, key: &str, value: &str) -> RespValue {
        self.storage.set(key.to_string(), value.to_string());
        RespValue::bulk_string("OK")
    }

    /// DELETE key
    fn cmd_delete(&self, key: &str) -> RespValue {
        RespValue::integer(i64::from(self.storage.delete(key)))
    }
}

/// Flattens a request into its string elements.
fn parse_request(request: RespValue) -> CommandResult<Vec<String>> {
    let elements = request.into_array().ok_or(CommandError::InvalidCommand)?;

    elements
        .into_iter()
        .map(|element| match element {
            RespValue::BulkString(s) | RespValue::SimpleString(s) => Ok(s),
            _ => Err(CommandError::InvalidCommand),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_handler() -> CommandHandler {
        CommandHandler::new(Arc::new(StorageEngine::new()))
    }

    fn run(handler: &CommandHandler, parts: &[&str]) -> CommandResult<RespValue> {
        handler.execute(RespValue::request(parts))
    }

    #[test]
    fn test_ping() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["PING"]), Ok(RespValue::bulk_string("PONG")));
    }

    #[test]
    fn test_case_insensitive() {
        let handler = create_handler();
        for verb in ["ping", "PING", "PiNg"] {
            assert_eq!(run(&handler, &[verb]), Ok(RespValue::bulk_string("PONG")));
        }

        assert_eq!(run(&handler, &["set", "k", "v"]), Ok(RespValue::bulk_string("OK")));
        assert_eq!(run(&handler, &["Get", "k"]), Ok(RespValue::bulk_string("v")));
    }

    #[test]
    fn test_ping_wrong_args() {
        let handler = create_handler();
        let err = run(&handler, &["PING", "extra"]).unwrap_err();
        assert!(err.to_string().contains("Wrong number of arguments"));
    }

    #[test]
    fn test_get_missing_is_null() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["GET", "nonexistent"]), Ok(RespValue::Null));
    }

    #[test]
    fn test_set_then_get() {
        let handler = create_handler();

        assert_eq!(
            run(&handler, &["SET", "mykey", "myvalue"]),
            Ok(RespValue::bulk_string("OK"))
        );
        assert_eq!(handler.storage().get("mykey"), Some("myvalue".to_string()));
        assert_eq!(
            run(&handler, &["GET", "mykey"]),
            Ok(RespValue::bulk_string("myvalue"))
        );
    }

    #[test]
    fn test_set_overwrites_existing() {
        let handler = create_handler();

        run(&handler, &["SET", "key", "old"]).unwrap();
        run(&handler, &["SET", "key", "new"]).unwrap();
        assert_eq!(run(&handler, &["GET", "key"]), Ok(RespValue::bulk_string("new")));
    }

    #[test]
    fn test_set_wrong_arity() {
        let handler = create_handler();

        for parts in [&["SET", "key"][..], &["SET", "key", "value", "extra"][..]] {
            let err = run(&handler, parts).unwrap_err();
            assert_eq!(err, CommandError::WrongArity("SET".to_string()));
            assert_eq!(err.to_string(), "ERR Wrong number of arguments for SET");
        }
    }

    #[test]
    fn test_get_and_delete_wrong_arity() {
        let handler = create_handler();

        let err = run(&handler, &["GET"]).unwrap_err();
        assert!(err.to_string().contains("Wrong number of arguments for GET"));

        let err = run(&handler, &["delete"]).unwrap_err();
        assert!(err.to_string().contains("Wrong number of arguments for DELETE"));
    }

    #[test]
    fn test_delete() {
        let handler = create_handler();

        handler.storage().set("deletekey".into(), "value".into());
        assert_eq!(run(&handler, &["DELETE", "deletekey"]), Ok(RespValue::integer(1)));
        assert!(!handler.storage().exists("deletekey"));
        assert_eq!(run(&handler, &["DELETE", "deletekey"]), Ok(RespValue::integer(0)));
    }

    #[test]
    fn test_unknown_command() {
        let handler = create_handler();

        let err = run(&handler, &["foo", "arg"]).unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("FOO".to_string()));
        assert!(err.to_string().contains("Unknown command"));
        assert!(err.to_string().contains("FOO"));
    }

    #[test]
    fn test_invalid_request_shapes() {
        let handler = create_handler();

        for request in [
            RespValue::Null,
            RespValue::array(vec![]),
            RespValue::bulk_string("PING"),
            RespValue::integer(1),
            RespValue::array(vec![RespValue::bulk_string("GET"), RespValue::integer(1)]),
        ] {
            assert_eq!(handler.execute(request), Err(CommandError::InvalidCommand));
        }
    }

    #[test]
    fn test_simple_string_arguments_accepted() {
        let handler = create_handler();
        let request = RespValue::array(vec![RespValue::simple_string("PING")]);
        assert_eq!(handler.execute(request), Ok(RespValue::bulk_string("PONG")));
    }

    #[test]
    fn test_handlers_share_storage() {
        let handler = create_handler();
        let other = handler.clone();

        run(&handler, &["SET", "shared", "yes"]).unwrap();
        assert_eq!(run(&other, &["GET", "shared"]), Ok(RespValue::bulk_string("yes")));
    }

    #[test]
    fn test_command_table() {
        for command in [Command::Ping, Command::Get, Command::Set, Command::Delete] {
            assert_eq!(Command::from_verb(command.name()), Some(command));
        }
        assert_eq!(Command::from_verb("DEL"), None);
        assert_eq!(Command::Set.arity(), 2);
    }
}
