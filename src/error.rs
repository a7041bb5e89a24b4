//! Errors reported by the console.
//!
//! Every variant is recoverable: the interpreter prints the message and reads
//! the next line.

use crate::store::StoreError;
use thiserror::Error;

/// Errors produced while resolving or executing a console command.
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// The line contained no tokens.
    #[error("empty command")]
    EmptyCommand,

    /// The first token is not a known verb.
    #[error("invalid command: {0}")]
    UnknownCommand(String),

    /// Fewer non-empty positional arguments than the verb requires.
    #[error("not enough arguments: {verb} requires {required}")]
    InsufficientArguments { verb: &'static str, required: usize },

    /// The key is not present in the store.
    #[error("key not found")]
    NotFound,

    /// `get ... json` on a value that is not valid JSON.
    #[error("value is not valid json: {0}")]
    MalformedValue(#[from] serde_json::Error),

    /// Any failure reported by the store engine.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The output sink could not be written.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used by the session and command handlers.
pub type Result<T> = std::result::Result<T, ConsoleError>;
