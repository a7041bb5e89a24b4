//! Turning a token sequence into a validated [`Command`].
//!
//! Resolution is purely syntactic: the verb must be known and enough
//! non-empty positional arguments must follow it. The store is never touched.

use crate::error::ConsoleError;
use crate::lexer::Token;

/// The verbs understood by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Scan,
    Keys,
    Stat,
    Expand,
    Exists,
    Get,
    Del,
    Put,
    Exit,
    Quit,
    /// Continue the scan started by `scan` or `keys`.
    It,
}

/// Verb name, verb and the number of positional arguments it requires.
static COMMAND_TABLE: [(&str, Verb, usize); 11] = [
    ("scan", Verb::Scan, 0),
    ("keys", Verb::Keys, 0),
    ("stat", Verb::Stat, 0),
    ("expand", Verb::Expand, 0),
    ("exists", Verb::Exists, 1),
    ("get", Verb::Get, 1),
    ("del", Verb::Del, 1),
    ("put", Verb::Put, 2),
    ("exit", Verb::Exit, 0),
    ("quit", Verb::Quit, 0),
    ("it", Verb::It, 0),
];

/// Flag literal that asks `get` to pretty-print the value as JSON.
const JSON_FLAG: &[u8] = b"json";

impl Verb {
    pub fn lookup(name: &str) -> Option<Verb> {
        COMMAND_TABLE
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, verb, _)| *verb)
    }

    pub fn name(self) -> &'static str {
        self.entry().0
    }

    /// Minimum number of positional arguments.
    pub fn required_args(self) -> usize {
        self.entry().2
    }

    // Table rows are in declaration order.
    fn entry(self) -> &'static (&'static str, Verb, usize) {
        &COMMAND_TABLE[self as usize]
    }
}

/// A resolved console command, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    /// First positional argument: the key, or the prefix for scans.
    pub key: Option<Vec<u8>>,
    /// Second positional argument, only taken for verbs that require two.
    pub value: Option<Vec<u8>>,
    /// Set when a `json` flag follows the positional arguments.
    pub json: bool,
}

/// Resolves a token sequence into a [`Command`].
///
/// An empty token never counts as a positional argument, so `put k ""` is
/// missing its value. Tokens following the arguments that were taken are
/// searched for the `json` flag.
pub fn resolve(args: &[Token]) -> Result<Command, ConsoleError> {
    let Some(first) = args.first() else {
        return Err(ConsoleError::EmptyCommand);
    };
    let name = String::from_utf8_lossy(first);
    let verb =
        Verb::lookup(&name).ok_or_else(|| ConsoleError::UnknownCommand(name.into_owned()))?;
    let required = verb.required_args();

    let mut taken = 0;
    let mut key = None;
    let mut value = None;
    if let Some(arg) = args.get(1).filter(|a| !a.is_empty()) {
        key = Some(arg.clone());
        taken += 1;
    }
    if required > 1 {
        if let Some(arg) = args.get(2).filter(|a| !a.is_empty()) {
            value = Some(arg.clone());
            taken += 1;
        }
    }
    if taken < required {
        return Err(ConsoleError::InsufficientArguments {
            verb: verb.name(),
            required,
        });
    }

    let json = args
        .iter()
        .skip(taken + 1)
        .any(|arg| arg.as_slice() == JSON_FLAG);

    Ok(Command {
        verb,
        key,
        value,
        json,
    })
}
