// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The logical `(x, y)` cursor position over a displayed buffer, and the
//! arrow/Home/End handling that keeps the on-screen cursor in sync with it.
//!
//! Grounded on `tui/src/core/graphemes/gc_string/owned/gc_string_owned_editor_impl.rs`
//! for "advance one grapheme, tracking column/row" bookkeeping, generalized
//! here to codepoints per `spec.md` §4.3, and on
//! `tui/src/core/ansi/vt_100_terminal_input_parser/keyboard.rs` for the
//! escape sequences a cursor move should emit.

use crate::{ansi, text};

pub use text::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Logical cursor position over a (possibly multi-line) displayed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Column (display cells, not bytes) within line `y`.
    pub x: usize,
    /// Row within the buffer.
    pub y: usize,
    /// Last column visited before an Up/Down move, restored when possible.
    pub last_x: usize,
    /// Longest column reached since the last reset — used by callers that
    /// need to know how far right a redraw must clear.
    pub max_x: usize,
}

impl Cursor {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn is_zero(&self) -> bool { self.x == 0 && self.y == 0 }

    /// Scans `buffer` one codepoint at a time, advancing one column per
    /// codepoint and starting a new line on `'\n'`, stopping when `(x, y)` is
    /// reached. Returns the byte offset at which that coordinate sits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `(x, y)` cannot be reached within
    /// `buffer`.
    pub fn get_string_idx(&self, buffer: &str) -> Result<usize> {
        let (mut cur_x, mut cur_y) = (0usize, 0usize);
        let mut last_idx = 0usize;

        for (byte_idx, ch) in buffer.char_indices() {
            if cur_y == self.y && cur_x == self.x {
                return Ok(byte_idx);
            }
            last_idx = byte_idx + ch.len_utf8();
            if ch == '\n' {
                cur_y += 1;
                cur_x = 0;
            } else {
                cur_x += 1;
            }
        }

        if cur_y == self.y && cur_x == self.x {
            return Ok(last_idx);
        }

        Err(Error::OutOfRange)
    }

    /// Right/Left arrow handling. Returns the escape sequence to emit, or
    /// `None` when the caller should route the key elsewhere (Up/Down are
    /// not handled by the cursor model; the terminal handler routes them to
    /// history navigation instead).
    #[must_use]
    pub fn handle_arrows(&mut self, arrow: ansi::Arrow, buffer: &str, ctrl: bool) -> Option<String> {
        match arrow {
            ansi::Arrow::Up | ansi::Arrow::Down => None,
            ansi::Arrow::Right => Some(self.move_right(buffer, ctrl)),
            ansi::Arrow::Left => Some(self.move_left(buffer, ctrl)),
        }
    }

    fn move_right(&mut self, buffer: &str, ctrl: bool) -> String {
        let lines = text::split_lines(buffer);
        let cur_line = lines.get(self.y).copied().unwrap_or("");
        let line_len = text::length_in_codepoints(cur_line);

        if ctrl {
            let idx = self.get_string_idx(buffer).unwrap_or(0);
            let new_idx = text::move_index_to_direction(buffer, idx, 1);
            let jumped = text::length_in_codepoints(&buffer[idx..new_idx]);
            let moved = jumped.min(line_len.saturating_sub(self.x));
            self.x += moved;
            self.last_x = self.x;
            self.max_x = self.max_x.max(self.x);
            return ansi::cursor_right(moved);
        }

        if self.x < line_len {
            self.x += 1;
            self.last_x = self.x;
            self.max_x = self.max_x.max(self.x);
            ansi::cursor_right(1)
        } else if self.y + 1 < lines.len() {
            self.y += 1;
            self.x = 0;
            self.last_x = 0;
            format!("{}{}", ansi::cursor_to_column(1), ansi::cursor_down(1))
        } else {
            String::new()
        }
    }

    fn move_left(&mut self, buffer: &str, ctrl: bool) -> String {
        if ctrl {
            let idx = self.get_string_idx(buffer).unwrap_or(0);
            let new_idx = text::move_index_to_direction(buffer, idx, -1);
            let moved = text::length_in_codepoints(&buffer[new_idx..idx]).min(self.x);
            self.x -= moved;
            self.last_x = self.x;
            return ansi::cursor_left(moved);
        }

        if self.x > 0 {
            self.x -= 1;
            self.last_x = self.x;
            ansi::cursor_left(1)
        } else if self.y > 0 {
            let lines = text::split_lines(buffer);
            self.y -= 1;
            let prev_len = lines.get(self.y).map_or(0, |l| text::length_in_codepoints(l));
            self.x = prev_len;
            self.last_x = prev_len;
            format!("{}{}", ansi::cursor_to_column(prev_len + 1), ansi::cursor_up(1))
        } else {
            String::new()
        }
    }

    /// Home (`dir == -1`) / End (`dir == 1`) handling. When `ctrl` is true
    /// this is reserved (no-op) per `spec.md` §4.3.
    #[must_use]
    pub fn handle_home_end(&mut self, dir: i8, buffer: &str, ctrl: bool) -> String {
        if ctrl {
            return String::new();
        }

        let lines = text::split_lines(buffer);
        let cur_line = lines.get(self.y).copied().unwrap_or("");
        let line_len = text::length_in_codepoints(cur_line);

        if dir < 0 {
            let steps = self.x;
            self.x = 0;
            self.last_x = 0;
            ansi::cursor_left(steps)
        } else {
            let steps = line_len.saturating_sub(self.x);
            self.x = line_len;
            self.last_x = line_len;
            self.max_x = self.max_x.max(self.x);
            ansi::cursor_right(steps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_zero() {
        assert!(Cursor::new().is_zero());
        let mut c = Cursor::new();
        c.x = 1;
        assert!(!c.is_zero());
    }

    #[test]
    fn test_get_string_idx_single_line() {
        let c = Cursor { x: 3, y: 0, ..Cursor::new() };
        assert_eq!(c.get_string_idx("hello"), Ok(3));
    }

    #[test]
    fn test_get_string_idx_multi_line() {
        let c = Cursor { x: 2, y: 1, ..Cursor::new() };
        assert_eq!(c.get_string_idx("ab\ncdef"), Ok(5));
    }

    #[test]
    fn test_get_string_idx_at_end() {
        let c = Cursor { x: 5, y: 0, ..Cursor::new() };
        assert_eq!(c.get_string_idx("hello"), Ok(5));
    }

    #[test]
    fn test_get_string_idx_out_of_range() {
        let c = Cursor { x: 99, y: 0, ..Cursor::new() };
        assert_eq!(c.get_string_idx("hi"), Err(Error::OutOfRange));
    }

    #[test]
    fn test_get_string_idx_inverse_of_advance() {
        let buffer = "hello\nworld";
        for (x, y, expected) in [(0, 0, 0), (5, 0, 5), (0, 1, 6), (5, 1, 11)] {
            let c = Cursor { x, y, ..Cursor::new() };
            assert_eq!(c.get_string_idx(buffer), Ok(expected));
        }
    }

    #[test]
    fn test_handle_arrows_up_down_not_handled() {
        let mut c = Cursor::new();
        assert_eq!(c.handle_arrows(ansi::Arrow::Up, "abc", false), None);
        assert_eq!(c.handle_arrows(ansi::Arrow::Down, "abc", false), None);
    }

    #[test]
    fn test_handle_arrows_right_plain() {
        let mut c = Cursor::new();
        let esc = c.handle_arrows(ansi::Arrow::Right, "abc", false);
        assert_eq!(esc, Some(ansi::cursor_right(1)));
        assert_eq!(c.x, 1);
    }

    #[test]
    fn test_handle_arrows_right_wraps_to_next_line() {
        let mut c = Cursor { x: 3, y: 0, ..Cursor::new() };
        c.handle_arrows(ansi::Arrow::Right, "abc\ndef", false);
        assert_eq!((c.x, c.y), (0, 1));
    }

    #[test]
    fn test_handle_arrows_left_wraps_to_prev_line() {
        let mut c = Cursor { x: 0, y: 1, ..Cursor::new() };
        c.handle_arrows(ansi::Arrow::Left, "abc\ndef", false);
        assert_eq!((c.x, c.y), (3, 0));
    }

    #[test]
    fn test_handle_arrows_ctrl_right_jumps_word() {
        let mut c = Cursor::new();
        c.handle_arrows(ansi::Arrow::Right, "hello world", true);
        assert_eq!(c.x, 5);
    }

    #[test]
    fn test_handle_home_end() {
        let mut c = Cursor { x: 2, y: 0, ..Cursor::new() };
        c.handle_home_end(-1, "hello", false);
        assert_eq!(c.x, 0);
        c.handle_home_end(1, "hello", false);
        assert_eq!(c.x, 5);
    }

    #[test]
    fn test_handle_home_end_ctrl_is_noop() {
        let mut c = Cursor { x: 2, y: 0, ..Cursor::new() };
        let esc = c.handle_home_end(-1, "hello", true);
        assert_eq!(esc, "");
        assert_eq!(c.x, 2);
    }
}
