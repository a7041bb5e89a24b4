use crate::error::{ConsoleError, Result};
use crate::parser::{Command, Verb};
use crate::session::Session;
use serde::de::IgnoredAny;

/// Printed by commands that change the store.
pub const OK: &[u8] = b"OK";

/// Object-safe trait for every command the console can run.
///
/// A handler is built from a resolved [`Command`] and consumed by a single
/// call to [`ConsoleCommand::execute`].
pub trait ConsoleCommand {
    /// Executes the command against the session, writing its output there.
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()>;
}

/// Builds the handler for a resolved command.
pub fn handler_for(command: Command) -> Box<dyn ConsoleCommand> {
    let key = command.key.unwrap_or_default();
    match command.verb {
        Verb::Get => Box::new(Get {
            key,
            json: command.json,
        }),
        Verb::Exists => Box::new(Exists { key }),
        Verb::Del => Box::new(Del { key }),
        Verb::Put => Box::new(Put {
            key,
            value: command.value.unwrap_or_default(),
        }),
        Verb::Scan => Box::new(Scan {
            prefix: non_empty(key),
        }),
        Verb::Keys => Box::new(Keys {
            prefix: non_empty(key),
        }),
        Verb::It => Box::new(Iterate),
        Verb::Stat => Box::new(Stat),
        Verb::Expand => Box::new(Expand),
        Verb::Exit | Verb::Quit => Box::new(Exit),
    }
}

fn non_empty(bytes: Vec<u8>) -> Option<Vec<u8>> {
    (!bytes.is_empty()).then_some(bytes)
}

/// Print the value stored under a key, optionally re-indented as JSON.
pub struct Get {
    pub key: Vec<u8>,
    pub json: bool,
}

impl ConsoleCommand for Get {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        let data = session
            .within_read(|txn| txn.get(&self.key)?.ok_or(ConsoleError::NotFound))?;
        if self.json {
            session.output(&pretty_json(&data)?)
        } else {
            session.output(&data)
        }
    }
}

const JSON_INDENT: &[u8] = b"    ";

/// Re-indents a JSON document with four spaces.
///
/// Only whitespace outside of strings changes: members, duplicates included,
/// and number literals are copied byte for byte. Empty objects and arrays
/// stay on one line.
fn pretty_json(data: &[u8]) -> Result<Vec<u8>> {
    serde_json::from_slice::<IgnoredAny>(data)?;

    let mut out = Vec::with_capacity(data.len() * 2);
    let mut depth = 0usize;
    let mut opened = false;
    let mut in_string = false;
    let mut escaped = false;

    for &b in data {
        if in_string {
            out.push(b);
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
            continue;
        }
        if std::mem::take(&mut opened) {
            if matches!(b, b'}' | b']') {
                out.push(b);
                continue;
            }
            depth += 1;
            push_newline(&mut out, depth);
        }
        match b {
            b'{' | b'[' => {
                out.push(b);
                opened = true;
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                push_newline(&mut out, depth);
                out.push(b);
            }
            b',' => {
                out.push(b);
                push_newline(&mut out, depth);
            }
            b':' => out.extend_from_slice(b": "),
            b'"' => {
                out.push(b);
                in_string = true;
            }
            _ => out.push(b),
        }
    }
    Ok(out)
}

fn push_newline(out: &mut Vec<u8>, depth: usize) {
    out.push(b'\n');
    for _ in 0..depth {
        out.extend_from_slice(JSON_INDENT);
    }
}

/// Print `true` or `false` depending on whether a key is present.
pub struct Exists {
    pub key: Vec<u8>,
}

impl ConsoleCommand for Exists {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        let found = session.within_read(|txn| Ok(txn.get(&self.key)?.is_some()))?;
        session.output(if found { &b"true"[..] } else { &b"false"[..] })
    }
}

/// Remove a key. Removing a missing key fails and changes nothing.
pub struct Del {
    pub key: Vec<u8>,
}

impl ConsoleCommand for Del {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        session.within_write(|txn| {
            if txn.delete(&self.key)? {
                Ok(())
            } else {
                Err(ConsoleError::NotFound)
            }
        })?;
        session.output(OK)
    }
}

/// Insert or replace a value.
pub struct Put {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl ConsoleCommand for Put {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        session.within_write(|txn| Ok(txn.put(&self.key, &self.value)?))?;
        session.output(OK)
    }
}

/// Start a scan printing keys and values, bounded by an optional prefix.
pub struct Scan {
    pub prefix: Option<Vec<u8>>,
}

impl ConsoleCommand for Scan {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        session.prepare_cursor(self.prefix, true);
        session.iterate(session.page_size())
    }
}

/// Start a scan printing only keys.
pub struct Keys {
    pub prefix: Option<Vec<u8>>,
}

impl ConsoleCommand for Keys {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        session.prepare_cursor(self.prefix, false);
        session.iterate(session.page_size())
    }
}

/// Print the next page of the current scan.
pub struct Iterate;

impl ConsoleCommand for Iterate {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        session.iterate(session.page_size())
    }
}

/// Print store statistics, one `name: value` per line.
pub struct Stat;

impl ConsoleCommand for Stat {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        let stat = session.within_read(|txn| Ok(txn.stat()?))?;
        session.output(format!("entries: {}", stat.entries).as_bytes())?;
        if let Some(height) = stat.tree_height {
            session.output(format!("tree_height: {}", height).as_bytes())?;
        }
        if let Some(bytes) = stat.stored_bytes {
            session.output(format!("stored_bytes: {}", bytes).as_bytes())?;
        }
        if let Some(bytes) = stat.file_bytes {
            session.output(format!("file_bytes: {}", bytes).as_bytes())?;
        }
        Ok(())
    }
}

/// Acknowledge a request to grow the store. The engine grows its file on
/// demand, so there is nothing to resize.
pub struct Expand;

impl ConsoleCommand for Expand {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        session.output(OK)
    }
}

/// Leave the console.
pub struct Exit;

impl ConsoleCommand for Exit {
    fn execute(self: Box<Self>, session: &mut Session) -> Result<()> {
        session.should_exit = true;
        Ok(())
    }
}
