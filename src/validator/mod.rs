// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Walks a parse tree, checking command existence, quote/bracket pairing,
//! and empty-region rules (`spec.md` §4.8).
//!
//! Grounded on `examples/original_source/include/command/built_in.hh` for the
//! fixed built-in set, and on `core/src/common/common_result_and_error.rs`
//! for the thiserror/miette split (a plain [`thiserror::Error`] enum for
//! logic, rendered through `miette` at the user-facing boundary).

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::parser::{GroupIdx, ParseTree, TokenKind};
use crate::text;

/// Commands this shell recognizes without consulting `$PATH` — identity
/// only; actually running them is out of scope (`spec.md` §1).
pub const BUILTINS: [&str; 4] = ["cd", "exit", "pwd", "calc"];

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("'{0}' is not a recognized command")]
    #[diagnostic(code(better_shell::validator::invalid_command))]
    InvalidCommand(String),

    #[error("unclosed quote")]
    #[diagnostic(code(better_shell::validator::unclosed_quote))]
    UnclosedQuote,

    #[error("{0}")]
    #[diagnostic(code(better_shell::validator::unclosed_bracket))]
    UnclosedBracket(String),

    #[error("unmatched closing bracket")]
    #[diagnostic(code(better_shell::validator::unmatched_closing_bracket))]
    UnmatchedClosingBracket,

    #[error("corrupted token")]
    #[diagnostic(code(better_shell::validator::corrupted_token))]
    CorruptedToken,

    #[error("corrupted token attribute")]
    #[diagnostic(code(better_shell::validator::corrupted_token_attribute))]
    CorruptedTokenAttribute,

    #[error("unsupported operation")]
    #[diagnostic(code(better_shell::validator::unsupported_operation))]
    UnsupportedOperation,

    #[error("empty substitution")]
    #[diagnostic(code(better_shell::validator::empty_substitution))]
    EmptySubstitution,

    #[error("empty string")]
    #[diagnostic(code(better_shell::validator::empty_string))]
    EmptyString,

    #[error("empty parameter")]
    #[diagnostic(code(better_shell::validator::empty_param))]
    EmptyParam,
}

/// A validation failure, located by the group and the index (within that
/// group's token list) whose byte offset the diagnostic renderer should
/// underline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub group: GroupIdx,
    pub token_idx: usize,
}

/// Confirmation prompts raised while validating ("did you mean …?").
/// Abstracted so tests never block on real stdin.
pub trait Prompt {
    fn confirm(&mut self, message: &str, default_yes: bool) -> bool;
}

/// Production [`Prompt`]: reads one line from stdin, matching the
/// `ask<Default, Options...>` helper in `spec.md` §4.9.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&mut self, message: &str, default_yes: bool) -> bool {
        use std::io::Write as _;
        loop {
            eprint!("{message}");
            let _ = std::io::stderr().flush();
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_err() {
                return default_yes;
            }
            let trimmed = line.trim().to_lowercase();
            match trimmed.as_str() {
                "" => return default_yes,
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => continue,
            }
        }
    }
}

/// Test/non-interactive [`Prompt`] that always declines.
#[derive(Debug, Default)]
pub struct AutoDeny;

impl Prompt for AutoDeny {
    fn confirm(&mut self, _message: &str, _default_yes: bool) -> bool { false }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool { true }

/// Bounded Levenshtein distance allowed for a `./`-relative path-segment
/// suggestion, per `spec.md` §4.8: `2 + 2 * segments`.
fn path_suggestion_bound(segments: usize) -> usize { 2 + 2 * segments }

/// Command-existence and structural checks over a [`ParseTree`], with
/// knowledge of built-ins and the `$PATH` binary map.
pub struct Validator<'a> {
    pub builtins: &'a HashSet<&'static str>,
    pub path_bins: &'a HashMap<String, PathBuf>,
    pub cwd: &'a Path,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub fn new(builtins: &'a HashSet<&'static str>, path_bins: &'a HashMap<String, PathBuf>, cwd: &'a Path) -> Self {
        Self { builtins, path_bins, cwd }
    }

    fn err(&self, group: GroupIdx, token_idx: usize, kind: ErrorKind) -> ValidationError {
        ValidationError { kind, group, token_idx }
    }

    /// Runs the checks of `spec.md` §4.8 over `group` (recursing into any
    /// `SubContent` children), returning the first failure found.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered, in source order.
    pub fn verify_syntax(
        &self,
        tree: &mut ParseTree,
        group: GroupIdx,
        prompt: &mut dyn Prompt,
    ) -> Result<(), ValidationError> {
        self.check_command(tree, group, prompt)?;
        self.check_remaining_tokens(tree, group, prompt)
    }

    fn check_command(
        &self,
        tree: &mut ParseTree,
        group: GroupIdx,
        prompt: &mut dyn Prompt,
    ) -> Result<(), ValidationError> {
        if tree.group(group).tokens.is_empty() {
            return Ok(());
        }

        let text = match &tree.group(group).tokens[0].kind {
            TokenKind::Command(s) => s.clone(),
            _ => return Err(self.err(group, 0, ErrorKind::CorruptedToken)),
        };

        if text.is_empty() {
            return Ok(());
        }

        if let Some(rel) = text.strip_prefix("./") {
            return self.check_relative_command(tree, group, &text, rel, prompt);
        }

        if self.builtins.contains(text.as_str()) || self.path_bins.contains_key(&text) {
            return Ok(());
        }

        let known_names = self.builtins.iter().map(|s| (*s).to_string()).chain(self.path_bins.keys().cloned());
        let best = known_names.min_by_key(|name| text::levenshtein(&text, name));

        if let Some(candidate) = best {
            if text::levenshtein(&text, &candidate) <= 2 {
                tracing::debug!(command = %text, candidate = %candidate, "command not found, suggesting closest match");
                if prompt.confirm(&format!("'{text}' not found — did you mean '{candidate}'? [Y/n] "), true) {
                    tree.groups[group].tokens[0].kind = TokenKind::Command(candidate);
                    return Ok(());
                }
            }
        }

        tracing::warn!(command = %text, "command not found and no suggestion accepted");
        Err(self.err(group, 0, ErrorKind::InvalidCommand(text)))
    }

    fn check_relative_command(
        &self,
        tree: &mut ParseTree,
        group: GroupIdx,
        full_text: &str,
        rel: &str,
        prompt: &mut dyn Prompt,
    ) -> Result<(), ValidationError> {
        let path = self.cwd.join(rel);

        if !path.exists() {
            if let Some(candidate) = self.suggest_path(&path) {
                let display = candidate.strip_prefix(self.cwd).unwrap_or(&candidate).display().to_string();
                if prompt.confirm(&format!("'{full_text}' not found — did you mean './{display}'? [Y/n] "), true) {
                    tree.groups[group].tokens[0].kind = TokenKind::Command(format!("./{display}"));
                    return Ok(());
                }
            }
            return Err(self.err(group, 0, ErrorKind::InvalidCommand(full_text.to_string())));
        }

        let metadata = fs::metadata(&path).map_err(|_| self.err(group, 0, ErrorKind::InvalidCommand(full_text.to_string())))?;
        if !metadata.is_file() {
            return Err(self.err(group, 0, ErrorKind::InvalidCommand(format!("{full_text}: not a file"))));
        }
        if !is_executable(&metadata) {
            return Err(self.err(group, 0, ErrorKind::InvalidCommand(format!("{full_text}: not an executable"))));
        }
        Ok(())
    }

    /// Walks each path segment of `target`, replacing segments that don't
    /// exist with the lowest-Levenshtein-distance sibling found in the
    /// directory, bounded by [`path_suggestion_bound`].
    fn suggest_path(&self, target: &Path) -> Option<PathBuf> {
        let relative = target.strip_prefix(self.cwd).ok()?;
        let components: Vec<String> =
            relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
        if components.is_empty() {
            return None;
        }
        let bound = path_suggestion_bound(components.len());

        let mut current = self.cwd.to_path_buf();
        for (i, wanted) in components.iter().enumerate() {
            let exact = current.join(wanted);
            if exact.exists() {
                current = exact;
                continue;
            }

            let entries = fs::read_dir(&current).ok()?;
            let mut best: Option<(String, usize)> = None;
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                let dist = text::levenshtein(wanted, &name);
                if best.as_ref().is_none_or(|(_, d)| dist < *d) {
                    best = Some((name, dist));
                }
            }
            let (name, dist) = best?;
            if dist > bound {
                return None;
            }
            current = current.join(name);
            let is_last = i + 1 == components.len();
            if !is_last && !current.is_dir() {
                return None;
            }
        }
        Some(current)
    }

    fn check_remaining_tokens(
        &self,
        tree: &mut ParseTree,
        group: GroupIdx,
        prompt: &mut dyn Prompt,
    ) -> Result<(), ValidationError> {
        let mut quote_open: Option<usize> = None;
        let mut i = 1usize;

        loop {
            let len = tree.group(group).tokens.len();
            if i >= len {
                break;
            }
            let kind = tree.group(group).tokens[i].kind.clone();

            match kind {
                TokenKind::SubContent(child) => {
                    let has_close = tree
                        .group(group)
                        .tokens
                        .get(i + 1)
                        .is_some_and(|t| matches!(&t.kind, TokenKind::SubBracket(s) if s == "}"));
                    if !has_close {
                        return Err(self.err(
                            group,
                            i - 1,
                            ErrorKind::UnclosedBracket("unclosed bracket".to_string()),
                        ));
                    }
                    self.verify_syntax(tree, child, prompt)?;
                    i += 2;
                }
                TokenKind::SubBracket(ref s) if s == "{" => {
                    let next_is_subcontent =
                        tree.group(group).tokens.get(i + 1).is_some_and(|t| matches!(t.kind, TokenKind::SubContent(_)));
                    if !next_is_subcontent {
                        return Err(self.err(group, i, ErrorKind::EmptySubstitution));
                    }
                    i += 1;
                }
                TokenKind::SubBracket(ref s) if s == "}" => {
                    return Err(self.err(group, i, ErrorKind::UnmatchedClosingBracket));
                }
                TokenKind::Parameter(ref s) => {
                    if s.is_empty() {
                        return Err(self.err(group, i, ErrorKind::EmptyParam));
                    }
                    i += 1;
                }
                TokenKind::StringQuote(_) => {
                    quote_open = if quote_open.is_none() { Some(i) } else { None };
                    i += 1;
                }
                TokenKind::StringContent(ref s) => {
                    if s.is_empty() {
                        let loc = quote_open.unwrap_or(i);
                        return Err(self.err(group, loc, ErrorKind::EmptyString));
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }

        if let Some(open_i) = quote_open {
            return Err(self.err(group, open_i, ErrorKind::UnclosedQuote));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn validator<'a>(
        builtins: &'a HashSet<&'static str>,
        path_bins: &'a HashMap<String, PathBuf>,
        cwd: &'a Path,
    ) -> Validator<'a> {
        Validator::new(builtins, path_bins, cwd)
    }

    #[test]
    fn test_builtin_command_passes() {
        let builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        let mut tree = parse(None, "cd /tmp");
        let v = validator(&builtins, &path_bins, &cwd);
        assert!(v.verify_syntax(&mut tree, tree.root, &mut AutoDeny).is_ok());
    }

    #[test]
    fn test_unknown_command_fails_without_suggestion() {
        let builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        let mut tree = parse(None, "zzzzznotacommand hi");
        let v = validator(&builtins, &path_bins, &cwd);
        let err = v.verify_syntax(&mut tree, tree.root, &mut AutoDeny).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidCommand(_)));
    }

    #[test]
    fn test_scenario_4_quoted_string_passes() {
        let mut builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        builtins.insert("echo");
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        let mut tree = parse(None, "echo \"hi there\"");
        let v = validator(&builtins, &path_bins, &cwd);
        assert!(v.verify_syntax(&mut tree, tree.root, &mut AutoDeny).is_ok());
    }

    #[test]
    fn test_scenario_5_unclosed_bracket() {
        let mut builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        builtins.insert("echo");
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        let mut tree = parse(None, "echo {oops");
        let v = validator(&builtins, &path_bins, &cwd);
        let err = v.verify_syntax(&mut tree, tree.root, &mut AutoDeny).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnclosedBracket(_)));
        assert_eq!(tree.group(err.group).tokens[err.token_idx].index, 5);
    }

    #[test]
    fn test_scenario_6_empty_string() {
        let mut builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        builtins.insert("echo");
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        let mut tree = parse(None, "echo \"");
        let v = validator(&builtins, &path_bins, &cwd);
        let err = v.verify_syntax(&mut tree, tree.root, &mut AutoDeny).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyString);
        assert_eq!(tree.group(err.group).tokens[err.token_idx].index, 5);
    }

    #[test]
    fn test_unmatched_closing_bracket() {
        let mut builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        builtins.insert("echo");
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        let mut tree = parse(None, "echo }");
        let v = validator(&builtins, &path_bins, &cwd);
        let err = v.verify_syntax(&mut tree, tree.root, &mut AutoDeny).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnmatchedClosingBracket);
    }

    #[test]
    fn test_empty_parameter_fails() {
        let builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        // A bare ":" followed by nothing cannot produce an empty Parameter
        // through the tokenizer; exercise the check directly via a
        // hand-built tree instead of relying on tokenizer output.
        let mut tree = parse(None, "cd");
        tree.groups[tree.root].tokens.push(crate::parser::Token::new(TokenKind::Parameter(String::new()), 3));
        let v = validator(&builtins, &path_bins, &cwd);
        let err = v.verify_syntax(&mut tree, tree.root, &mut AutoDeny).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyParam);
    }

    #[test]
    fn test_nested_substitution_recurses() {
        let mut builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        builtins.insert("echo");
        builtins.insert("cat");
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        let mut tree = parse(None, "echo {cat /etc/hostname}");
        let v = validator(&builtins, &path_bins, &cwd);
        assert!(v.verify_syntax(&mut tree, tree.root, &mut AutoDeny).is_ok());
    }

    #[test]
    fn test_nested_substitution_invalid_inner_command_propagates() {
        let mut builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        builtins.insert("echo");
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        let mut tree = parse(None, "echo {zzzznotacommand}");
        let v = validator(&builtins, &path_bins, &cwd);
        let err = v.verify_syntax(&mut tree, tree.root, &mut AutoDeny).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidCommand(_)));
        assert_ne!(err.group, tree.root);
    }
}
