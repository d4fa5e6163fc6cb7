// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The driver loop that turns terminal-handler bytes into completed lines
//! (`spec.md` §4.6).
//!
//! Grounded on `tui/src/readline_async/readline_async_impl/readline.rs`'s
//! read-loop shape, collapsed here to the synchronous single-threaded model
//! `spec.md` §5 mandates.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::history::HistoryStore;
use crate::terminal::{HandleResult, LineState, TerminalHandler};

/// Outcome of one [`InputLoop::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line was submitted; `out` holds it.
    Line,
    /// EOT/EOF, or the process-wide "should exit" flag was set.
    Exit,
}

pub struct InputLoop {
    handler: TerminalHandler,
    history: HistoryStore,
    should_exit: Arc<AtomicBool>,
}

impl InputLoop {
    /// # Errors
    ///
    /// Returns an I/O error if raw mode or the SIGINT handler can't be
    /// installed.
    pub fn new(prompt: impl Into<String>, history: HistoryStore) -> io::Result<Self> {
        Ok(Self { handler: TerminalHandler::new(prompt)?, history, should_exit: Arc::new(AtomicBool::new(false)) })
    }

    /// The flag a future `exit` built-in would set to end the loop without
    /// a panic or an abrupt process exit.
    #[must_use]
    pub fn should_exit_flag(&self) -> Arc<AtomicBool> { Arc::clone(&self.should_exit) }

    /// Reads one full line from stdin, handling SIGINT and EOT along the
    /// way. Appends the submitted text (without the trailing newline) to
    /// `out`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading from or writing to the terminal
    /// fails.
    pub fn read(&mut self, out: &mut String) -> io::Result<ReadOutcome> {
        let mut stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut line = LineState::new();

        self.handler.show_prompt(&mut stdout)?;
        stdout.flush()?;

        loop {
            if self.should_exit.load(Ordering::SeqCst) {
                return Ok(ReadOutcome::Exit);
            }
            if self.handler.sigint_raised() {
                self.handler.handle_sigint(&mut line, &mut stdout)?;
                self.handler.show_prompt(&mut stdout)?;
                stdout.flush()?;
                continue;
            }

            let mut byte = [0u8; 1];
            if stdin.read(&mut byte)? == 0 {
                return Ok(ReadOutcome::Exit);
            }

            let result = self.handler.handle(byte[0], &mut line, &mut self.history, &mut stdin, &mut stdout)?;
            stdout.flush()?;

            match result {
                HandleResult::Done => break,
                HandleResult::Exit => return Ok(ReadOutcome::Exit),
                HandleResult::Continue => {}
                HandleResult::None => {
                    if !self.handler.is_active() {
                        out.push(byte[0] as char);
                    }
                    if byte[0] == b'\n' {
                        break;
                    }
                }
            }
        }

        if self.handler.is_active() {
            out.push_str(&line.buffer);
        }
        Ok(ReadOutcome::Line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_history() -> HistoryStore {
        let path = std::env::temp_dir().join(format!("better-shell-input-loop-test-{}", rand::random::<u64>()));
        HistoryStore::open(&path).unwrap()
    }

    #[test]
    fn test_should_exit_flag_is_shared() {
        let loop_ = InputLoop::new("> ", temp_history()).unwrap();
        let flag = loop_.should_exit_flag();
        flag.store(true, Ordering::SeqCst);
        assert!(loop_.should_exit.load(Ordering::SeqCst));
    }
}
