//! An interactive console for an embedded, transactional key-value store.
//!
//! A line typed at the console is split into byte-string tokens
//! ([`lexer`]), resolved into a validated command ([`parser`]) and executed
//! by a handler ([`builtin`]) against a [`Session`]. The session owns the
//! store handle, wraps every command in a read or write transaction and keeps
//! at most one paginated scan cursor open between lines.
//!
//! The main entry point is [`Interpreter`], which drives a session from an
//! interactive terminal or from piped input.

pub mod builtin;
pub mod config;
pub mod cursor;
pub mod error;
pub mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod parser;
pub mod session;
pub mod store;

pub use error::ConsoleError;
pub use interpreter::Interpreter;
pub use session::Session;
