// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Append-only, file-backed history of previously submitted lines with a
//! movable read cursor.
//!
//! Grounded on `tui/src/readline_async/readline_async_impl/readline_history.rs`
//! for the in-memory-list-plus-index shape, and on `cmdr/src/ch/prompt_history.rs`
//! for the "resolve a config-style path, create parent dirs on demand" pattern.

use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("neither XDG_HOME_CACHE nor HOME is set; cannot locate the history file")]
    ConfigError,

    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Append-only history of previously submitted lines, backed by a file, with
/// a movable read cursor for Up/Down navigation.
#[derive(Debug)]
pub struct HistoryStore {
    entries: Vec<String>,
    index: usize,
    file: File,
    /// Set on the first `get_prev()` call since the last [`HistoryStore::reset`];
    /// cleared after that first call returns the current entry without
    /// decrementing, matching the "first Up-arrow yields the most recent
    /// line" user expectation documented in `spec.md` §9.
    first_prev_since_reset: bool,
}

impl HistoryStore {
    /// Opens (creating if absent) the history file at `path`, creating parent
    /// directories as needed, and loads existing entries into memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file or its parent directories cannot be
    /// created or read.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let existing = fs::read_to_string(path).unwrap_or_default();
        let entries: Vec<String> = existing
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let index = entries.len().saturating_sub(1);
        Ok(Self { entries, index, file, first_prev_since_reset: true })
    }

    /// Opens the default history location:
    /// `$XDG_HOME_CACHE/better/better-shell/history`, falling back to
    /// `$HOME/.cache/better/better-shell/history`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if neither environment variable is set,
    /// or [`Error::Io`] if the file can't be opened.
    pub fn open_default() -> Result<Self> {
        let base = std::env::var_os("XDG_HOME_CACHE").map(PathBuf::from).or_else(|| {
            tracing::debug!("XDG_HOME_CACHE unset, falling back to $HOME/.cache");
            std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache"))
        });
        let Some(base) = base else {
            tracing::warn!("neither XDG_HOME_CACHE nor HOME is set; cannot locate the history file");
            return Err(Error::ConfigError);
        };

        Self::open(&base.join("better").join("better-shell").join("history"))
    }

    #[must_use]
    pub fn entries(&self) -> &[String] { &self.entries }

    /// Appends `text` to the in-memory list and to the file, trimmed.
    /// Ignores empty/whitespace-only text, and consecutive duplicates of the
    /// current last entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the write or flush fails.
    pub fn push_back(&mut self, text: &str) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        if self.entries.last().is_some_and(|last| last == trimmed) {
            return Ok(());
        }

        self.entries.push(trimmed.to_string());
        writeln!(self.file, "{trimmed}")?;
        self.file.flush()?;
        Ok(())
    }

    /// Moves the read cursor one entry forward (towards the most recent),
    /// returning `None` once it's already at the last entry.
    pub fn get_next(&mut self) -> Option<&str> {
        if self.entries.is_empty() || self.index >= self.entries.len() - 1 {
            return None;
        }
        self.index += 1;
        self.first_prev_since_reset = false;
        Some(&self.entries[self.index])
    }

    /// Moves the read cursor one entry backward (towards the oldest). The
    /// first call after a [`HistoryStore::reset`] returns the current entry
    /// without decrementing — so the first Up-arrow yields the most recent
    /// line, and only subsequent Ups walk further back.
    pub fn get_prev(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        if self.index == 0 {
            return Some(&self.entries[0]);
        }
        if self.first_prev_since_reset {
            self.first_prev_since_reset = false;
        } else {
            self.index -= 1;
        }
        Some(&self.entries[self.index])
    }

    /// Resets the read cursor to the most recent entry.
    pub fn reset(&mut self) {
        self.index = self.entries.len().saturating_sub(1);
        self.first_prev_since_reset = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_history_path() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("better-shell-history-test-{}", rand::random::<u64>()));
        p
    }

    #[test]
    fn test_push_back_ignores_empty_and_duplicates() {
        let path = temp_history_path();
        let mut h = HistoryStore::open(&path).unwrap();
        h.push_back("  ").unwrap();
        h.push_back("cmd one").unwrap();
        h.push_back("cmd one").unwrap();
        h.push_back("cmd two").unwrap();
        assert_eq!(h.entries(), &["cmd one", "cmd two"]);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_push_back_grows_file_by_one_entry() {
        let path = temp_history_path();
        let mut h = HistoryStore::open(&path).unwrap();
        h.push_back("cmd one").unwrap();
        let reloaded = HistoryStore::open(&path).unwrap();
        assert_eq!(reloaded.entries(), &["cmd one"]);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_prev_next_navigation() {
        let path = temp_history_path();
        let mut h = HistoryStore::open(&path).unwrap();
        h.push_back("cmd one").unwrap();
        h.push_back("cmd two").unwrap();
        h.reset();

        assert_eq!(h.get_prev(), Some("cmd two"));
        assert_eq!(h.get_prev(), Some("cmd one"));
        assert_eq!(h.get_prev(), Some("cmd one"));
        assert_eq!(h.get_next(), Some("cmd two"));
        assert_eq!(h.get_next(), None);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_empty_history_navigation() {
        let path = temp_history_path();
        let mut h = HistoryStore::open(&path).unwrap();
        assert_eq!(h.get_prev(), None);
        assert_eq!(h.get_next(), None);
        fs::remove_file(&path).ok();
    }
}
