use crate::builtin::handler_for;
use crate::lexer;
use crate::parser::{self, Verb};
use crate::session::Session;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::BufRead;
use tracing::{debug, warn};

/// Prompt shown by the interactive loop.
pub const PROMPT: &str = "> ";

/// Reads console lines and runs them against a [`Session`].
///
/// Example
/// ```
/// use kv_console::store::MemStore;
/// use kv_console::{Interpreter, Session};
///
/// let session = Session::new(Box::new(MemStore::new()), Box::new(std::io::sink()));
/// let mut console = Interpreter::new(session);
/// console.run_line(b"put greeting hello");
/// console.run_line(b"quit");
/// assert!(console.session().should_exit);
/// ```
pub struct Interpreter {
    session: Session,
}

impl Interpreter {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Tokenizes, resolves and executes one line.
    ///
    /// Any open cursor is closed first unless the line continues the scan.
    /// Errors are printed to the session output and never stop the console.
    pub fn run_line(&mut self, line: &[u8]) {
        let args = lexer::split_into_tokens(line);
        let command = parser::resolve(&args);

        if !matches!(&command, Ok(cmd) if cmd.verb == Verb::It) {
            self.session.close_cursor();
        }

        let result = command.and_then(|cmd| {
            debug!(verb = cmd.verb.name(), "dispatching command");
            handler_for(cmd).execute(&mut self.session)
        });
        if let Err(e) = result {
            debug!(error = %e, "command failed");
            if let Err(out_err) = self.session.output(e.to_string().as_bytes()) {
                warn!(error = %out_err, "could not report command error");
            }
        }
    }

    /// Runs every line from `input` until it is exhausted or a command ends
    /// the session. Used for piped, non-interactive input.
    pub fn run_script<R: BufRead>(&mut self, mut input: R) -> std::io::Result<()> {
        let mut line = Vec::new();
        while !self.session.should_exit {
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            self.run_line(&line);
        }
        Ok(())
    }

    /// Interactive loop with line editing and history.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.session.should_exit {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.run_line(line.as_bytes());
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}
