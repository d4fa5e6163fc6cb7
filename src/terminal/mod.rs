// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The raw-mode terminal input handler: per-byte state machine, UTF-8
//! reassembly, backspace, selection highlighting, redraw, and history
//! navigation (`spec.md` §4.5).
//!
//! Grounded on `tui/src/readline_async/readline_async_impl/line_state/core.rs`
//! for the per-line editing-state shape (buffer, escape flag, highlight
//! span), reworked here as a synchronous, single-threaded state machine
//! (`spec.md` §5) rather than the teacher's async event loop.

pub mod raw_mode;

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ansi::{self, Arrow};
use crate::cursor::Cursor;
use crate::history::HistoryStore;
use crate::text;
use raw_mode::RawModeGuard;

/// Outcome of one [`TerminalHandler::handle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleResult {
    /// Byte fully handled; keep reading.
    Continue,
    /// Caller should append the raw byte to its own accumulator verbatim —
    /// either because the handler is inactive (non-tty), or (for a plain
    /// ASCII byte) because the handler already folded it into its own
    /// editing buffer and has nothing further to do.
    None,
    /// The line is complete.
    Done,
    /// EOT/EOF encountered.
    Exit,
}

/// Per-submitted-line editing state.
#[derive(Debug, Default)]
pub struct LineState {
    pub buffer: String,
    reassembly: Vec<u8>,
    expected_len: usize,
    escaped: bool,
    highlight_start: Option<usize>,
    scratch: Option<String>,
}

impl LineState {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Resets all per-line state, keeping the struct ready for the next
    /// line — called after a completed read or a SIGINT cancellation.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.reassembly.clear();
        self.expected_len = 0;
        self.escaped = false;
        self.highlight_start = None;
        self.scratch = None;
    }
}

/// Reads a full CSI sequence from `stream`, starting immediately after the
/// `ESC` byte. Returns `Ok(None)` on EOF/EOT (the caller should report
/// [`HandleResult::Exit`]).
fn read_csi(stream: &mut dyn Read) -> io::Result<Option<String>> {
    let mut byte = [0u8; 1];
    if stream.read(&mut byte)? == 0 {
        return Ok(None);
    }
    if byte[0] != b'[' {
        return Ok(Some((byte[0] as char).to_string()));
    }

    let mut seq = String::from("[");
    loop {
        if stream.read(&mut byte)? == 0 {
            return Ok(None);
        }
        let c = byte[0] as char;
        seq.push(c);
        if c.is_ascii_alphabetic() || c == '~' {
            break;
        }
    }
    Ok(Some(seq))
}

/// Owns raw-mode acquisition/release, the logical cursor, and the SIGINT
/// flag for one process's terminal session.
pub struct TerminalHandler {
    raw_mode: RawModeGuard,
    cursor: Cursor,
    prompt: String,
    sigint: Arc<AtomicBool>,
}

impl TerminalHandler {
    /// Acquires raw mode (no-op if stdin isn't a tty) and registers the
    /// process-wide SIGINT flag.
    ///
    /// # Errors
    ///
    /// Returns [`raw_mode::Error`] if termios attributes can't be read/set,
    /// or an I/O error if the SIGINT handler can't be registered.
    pub fn new(prompt: impl Into<String>) -> io::Result<Self> {
        let raw_mode = RawModeGuard::acquire().map_err(io::Error::other)?;
        let sigint = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&sigint))?;
        Ok(Self { raw_mode, cursor: Cursor::new(), prompt: prompt.into(), sigint })
    }

    #[must_use]
    pub fn is_active(&self) -> bool { self.raw_mode.is_active() }

    #[must_use]
    pub fn sigint_flag(&self) -> Arc<AtomicBool> { Arc::clone(&self.sigint) }

    pub fn show_prompt(&self, stdout: &mut dyn Write) -> io::Result<()> { write!(stdout, "{}", self.prompt) }

    /// The per-byte state machine of `spec.md` §4.5.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing the redraw escapes, or reading a CSI
    /// continuation, fails.
    pub fn handle(
        &mut self,
        byte: u8,
        line: &mut LineState,
        history: &mut HistoryStore,
        stream: &mut dyn Read,
        stdout: &mut dyn Write,
    ) -> io::Result<HandleResult> {
        if !self.is_active() {
            return Ok(HandleResult::None);
        }

        match byte {
            b'\n' => self.handle_newline(line, history),
            0x1B => match read_csi(stream)? {
                None => Ok(HandleResult::Exit),
                Some(seq) => {
                    self.handle_ansi(&seq, line, history, stdout)?;
                    Ok(HandleResult::Continue)
                }
            },
            0x7F | 0x08 => {
                self.handle_backspace(line, false, stdout)?;
                Ok(HandleResult::Continue)
            }
            0x04 => Ok(HandleResult::Exit),
            b if text::is_leading_byte(b) && text::get_expected_length(b).unwrap_or(1) > 1 => {
                line.reassembly.clear();
                line.reassembly.push(b);
                line.expected_len = text::get_expected_length(b).unwrap_or(1);
                Ok(HandleResult::Continue)
            }
            b if text::is_continuation_byte(b) => {
                line.reassembly.push(b);
                if line.reassembly.len() >= line.expected_len.max(1) {
                    if let Ok(s) = std::str::from_utf8(&line.reassembly) {
                        self.insert_str(line, s, stdout)?;
                    }
                    line.reassembly.clear();
                    line.expected_len = 0;
                }
                Ok(HandleResult::Continue)
            }
            b => {
                let s = (b as char).to_string();
                self.insert_str(line, &s, stdout)?;
                Ok(HandleResult::None)
            }
        }
    }

    fn handle_newline(&mut self, line: &mut LineState, history: &mut HistoryStore) -> io::Result<HandleResult> {
        if line.buffer.trim().is_empty() {
            return Ok(HandleResult::Done);
        }
        if line.escaped && line.buffer.ends_with('\\') {
            line.buffer.pop();
            line.buffer.push('\n');
            line.escaped = false;
            return Ok(HandleResult::Continue);
        }
        history.push_back(&line.buffer).map_err(io::Error::other)?;
        history.reset();
        Ok(HandleResult::Done)
    }

    fn insert_str(&mut self, line: &mut LineState, s: &str, stdout: &mut dyn Write) -> io::Result<()> {
        let idx = self.cursor.get_string_idx(&line.buffer).unwrap_or(line.buffer.len());
        line.buffer.insert_str(idx, s);
        line.escaped = s == "\\";

        if s == "\n" {
            write!(stdout, "\r\n")?;
            self.cursor.x = 0;
            self.cursor.y += 1;
            return Ok(());
        }

        write!(stdout, "{}", ansi::save_cursor())?;
        write!(stdout, "{s}")?;
        write!(stdout, "{}", &line.buffer[idx + s.len()..])?;
        write!(stdout, "{}", ansi::restore_cursor())?;
        write!(stdout, "{}", ansi::cursor_right(text::length_in_codepoints(s)))?;

        let width = unicode_width::UnicodeWidthStr::width(s).max(1);
        self.cursor.x += width;
        self.cursor.last_x = self.cursor.x;
        self.cursor.max_x = self.cursor.max_x.max(self.cursor.x);
        Ok(())
    }

    fn handle_backspace(&mut self, line: &mut LineState, ctrl: bool, stdout: &mut dyn Write) -> io::Result<()> {
        let cur = self.cursor.get_string_idx(&line.buffer).unwrap_or(0);
        if cur == 0 {
            return Ok(());
        }

        let start = if ctrl {
            text::move_index_to_direction(&line.buffer, cur, -1)
        } else {
            let mut start = cur - 1;
            while !line.buffer.is_char_boundary(start) {
                start -= 1;
            }
            start
        };

        let removed_cols = text::length_in_codepoints(&line.buffer[start..cur]);
        line.buffer.replace_range(start..cur, "");
        line.escaped = false;

        write!(stdout, "{}", ansi::cursor_left(removed_cols))?;
        write!(stdout, "{}", ansi::save_cursor())?;
        write!(stdout, "{}{}", &line.buffer[start..], " ".repeat(removed_cols))?;
        write!(stdout, "{}", ansi::restore_cursor())?;

        self.cursor.x = self.cursor.x.saturating_sub(removed_cols);
        self.cursor.last_x = self.cursor.x;
        Ok(())
    }

    fn handle_ansi(
        &mut self,
        seq: &str,
        line: &mut LineState,
        history: &mut HistoryStore,
        stdout: &mut dyn Write,
    ) -> io::Result<()> {
        let shift = ansi::is_shift_pressed(seq);
        let ctrl = ansi::is_ctrl_pressed(seq);
        let home_end = ansi::is_home_end(seq);

        if home_end != 0 {
            if shift {
                self.begin_highlight_if_needed(line);
                self.cursor.handle_home_end(home_end, &line.buffer, ctrl);
                return self.redraw_highlight(line, stdout);
            }
            self.clear_highlight_and_redraw(line, stdout)?;
            let esc = self.cursor.handle_home_end(home_end, &line.buffer, ctrl);
            return write!(stdout, "{esc}");
        }

        if !ansi::is_arrow(seq) {
            return Ok(());
        }
        let Some(arrow) = Arrow::from_terminator(*seq.as_bytes().last().unwrap()) else {
            return Ok(());
        };

        match arrow {
            Arrow::Up | Arrow::Down => self.handle_history_nav(arrow, line, history, stdout),
            Arrow::Left | Arrow::Right => {
                if shift {
                    self.begin_highlight_if_needed(line);
                    self.cursor.handle_arrows(arrow, &line.buffer, ctrl);
                    self.redraw_highlight(line, stdout)
                } else {
                    self.clear_highlight_and_redraw(line, stdout)?;
                    if let Some(esc) = self.cursor.handle_arrows(arrow, &line.buffer, ctrl) {
                        write!(stdout, "{esc}")?;
                    }
                    Ok(())
                }
            }
        }
    }

    fn begin_highlight_if_needed(&mut self, line: &mut LineState) {
        if line.highlight_start.is_none() {
            line.highlight_start = Some(self.cursor.get_string_idx(&line.buffer).unwrap_or(0));
        }
    }

    /// Redraws the whole line with `buf[start..end]` in reverse video, per
    /// `spec.md` §4.5's `handle_highlight` algorithm.
    fn redraw_highlight(&mut self, line: &mut LineState, stdout: &mut dyn Write) -> io::Result<()> {
        let Some(start_byte) = line.highlight_start else { return Ok(()) };
        let cur_byte = self.cursor.get_string_idx(&line.buffer).unwrap_or(line.buffer.len());
        let (start, end) = (start_byte.min(cur_byte), start_byte.max(cur_byte));

        write!(stdout, "{}", ansi::save_cursor())?;
        write!(stdout, "\r{}", ansi::clear_to_end_of_line())?;
        write!(stdout, "{}{}", self.prompt, &line.buffer[..start])?;
        write!(stdout, "{}{}", ansi::reverse_video(), &line.buffer[start..end])?;
        write!(stdout, "{}{}", ansi::sgr_reset(), &line.buffer[end..])?;
        write!(stdout, "{}", ansi::restore_cursor())
    }

    /// When a non-Shift keystroke arrives mid-selection: commit (clear) the
    /// highlight and redraw once without reverse-video, per the resolved
    /// Open Question in `spec.md` §9.
    fn clear_highlight_and_redraw(&mut self, line: &mut LineState, stdout: &mut dyn Write) -> io::Result<()> {
        if line.highlight_start.take().is_some() {
            write!(stdout, "{}", ansi::save_cursor())?;
            write!(stdout, "\r{}", ansi::clear_to_end_of_line())?;
            write!(stdout, "{}{}", self.prompt, line.buffer)?;
            write!(stdout, "{}", ansi::restore_cursor())?;
        }
        Ok(())
    }

    fn handle_history_nav(
        &mut self,
        arrow: Arrow,
        line: &mut LineState,
        history: &mut HistoryStore,
        stdout: &mut dyn Write,
    ) -> io::Result<()> {
        if line.scratch.is_none() {
            line.scratch = Some(line.buffer.clone());
        }

        let new_line = match arrow {
            Arrow::Up => history.get_prev().map(str::to_string),
            Arrow::Down => match history.get_next() {
                Some(s) => Some(s.to_string()),
                None => line.scratch.take(),
            },
            Arrow::Left | Arrow::Right => return Ok(()),
        };

        let Some(new_line) = new_line else { return Ok(()) };

        let old_cols = text::length_in_codepoints(&line.buffer);
        line.buffer = new_line;
        let new_cols = text::length_in_codepoints(&line.buffer);

        write!(stdout, "\r{}", ansi::clear_to_end_of_line())?;
        write!(stdout, "{}{}", self.prompt, line.buffer)?;
        if new_cols < old_cols {
            write!(stdout, "{}", " ".repeat(old_cols - new_cols))?;
        }

        self.cursor.x = new_cols;
        self.cursor.y = 0;
        self.cursor.last_x = new_cols;
        Ok(())
    }

    /// Clears the in-progress line on SIGINT: prints `^C` on its own line
    /// and resets editing state, without exiting the process.
    pub fn handle_sigint(&mut self, line: &mut LineState, stdout: &mut dyn Write) -> io::Result<()> {
        tracing::debug!(buffer_len = line.buffer.len(), "SIGINT received, clearing in-progress line");
        write!(stdout, "^C\r\n")?;
        line.reset();
        self.cursor = Cursor::new();
        self.sigint.store(false, Ordering::SeqCst);
        Ok(())
    }

    #[must_use]
    pub fn sigint_raised(&self) -> bool { self.sigint.load(Ordering::SeqCst) }
}
