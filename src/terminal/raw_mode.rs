// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! RAII guard around termios raw mode, using rustix's safe termios API.
//!
//! Grounded on `tui/src/core/ansi/terminal_raw_mode/raw_mode_unix.rs`'s
//! `cfmakeraw`-derived flag set, reshaped per `spec.md` §9's design note:
//! the original stores termios in a process-wide static; here it's owned by
//! one [`RawModeGuard`] instance, acquired at construction and released
//! exactly once in `Drop`, with no back-pointer to reason about.

use rustix::termios::{self, ControlModes, InputModes, LocalModes, OptionalActions, OutputModes, SpecialCodeIndex, Termios};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to retrieve terminal attributes: {0}")]
    Get(#[source] rustix::io::Errno),

    #[error("failed to set terminal attributes: {0}")]
    Set(#[source] rustix::io::Errno),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Raw-mode guard over stdin. Inactive (every method a no-op) when stdin
/// isn't a tty, matching `spec.md` §4.5's "the handler becomes inactive"
/// rule for piped/redirected input.
pub struct RawModeGuard {
    original: Option<Termios>,
}

impl RawModeGuard {
    /// Enables raw mode on stdin, saving the original settings for restore
    /// on drop. If stdin isn't a tty, returns an inactive guard.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if terminal attributes can't be read or set.
    pub fn acquire() -> Result<Self> {
        let stdin = io::stdin();
        if !termios::isatty(&stdin) {
            tracing::debug!("stdin is not a tty; raw mode guard stays inactive");
            return Ok(Self { original: None });
        }

        let mut attrs = termios::tcgetattr(&stdin).map_err(Error::Get)?;
        let original = attrs.clone();

        attrs.input_modes.remove(
            InputModes::IGNBRK
                | InputModes::BRKINT
                | InputModes::PARMRK
                | InputModes::ISTRIP
                | InputModes::INLCR
                | InputModes::IGNCR
                | InputModes::ICRNL
                | InputModes::IXON,
        );
        attrs.output_modes.remove(OutputModes::OPOST);
        // ISIG stays set: the kernel must still raise SIGINT on Ctrl+C.
        attrs.local_modes.remove(LocalModes::ECHO | LocalModes::ECHONL | LocalModes::ICANON | LocalModes::IEXTEN);
        attrs.control_modes.remove(ControlModes::CSIZE | ControlModes::PARENB);
        attrs.control_modes.insert(ControlModes::CS8);

        attrs.special_codes[SpecialCodeIndex::VMIN] = 1;
        attrs.special_codes[SpecialCodeIndex::VTIME] = 0;

        termios::tcsetattr(&stdin, OptionalActions::Now, &attrs).map_err(Error::Set)?;

        Ok(Self { original: Some(original) })
    }

    #[must_use]
    pub fn is_active(&self) -> bool { self.original.is_some() }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            let stdin = io::stdin();
            let _ = termios::tcsetattr(&stdin, OptionalActions::Now, &original);
        }
    }
}
