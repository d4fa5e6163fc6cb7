// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Interactive front-end of a command shell: a raw-mode line editor with
//! history, a recursive descent tokenizer building a positioned parse tree,
//! a validator checking commands against `PATH` and built-ins, and a boxed
//! diagnostic renderer for anything that fails to validate.
//!
//! Command execution, built-ins, job control, and configuration loading are
//! out of scope; this crate's job ends at producing a validated parse tree
//! or a rendered diagnostic.

pub mod ansi;
pub mod cli;
pub mod cursor;
pub mod diagnostics;
pub mod history;
pub mod input_loop;
pub mod logging;
pub mod parser;
pub mod path_scan;
pub mod terminal;
pub mod text;
pub mod validator;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use miette::IntoDiagnostic as _;

use cli::Cli;
use validator::{AutoDeny, Prompt, StdinPrompt, Validator, BUILTINS};

pub const APP_NAME: &str = "better-shell";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parses, validates, and prints one line: JSON on success, a rendered
/// diagnostic on failure. Returns `true` when the line was valid.
fn process_line(
    raw: &str,
    source_label: &str,
    builtins: &HashSet<&'static str>,
    path_bins: &HashMap<String, PathBuf>,
    cwd: &Path,
    prompt: &mut dyn Prompt,
) -> bool {
    let mut tree = parser::parse(Some(source_label.to_string()), raw);
    let validator = Validator::new(builtins, path_bins, cwd);

    match validator.verify_syntax(&mut tree, tree.root, prompt) {
        Ok(()) => {
            match parser::to_json_pretty(&tree) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("error: failed to serialize parse tree: {e}"),
            }
            true
        }
        Err(err) => {
            let info = diagnostics::resolve(&tree, &err, source_label, raw);
            let spans = diagnostics::render(&info);
            let rendered = diagnostics::render_to_string(&spans, diagnostics::no_color_requested());
            eprint!("{rendered}");
            false
        }
    }
}

/// Runs a single `--command` invocation and returns the process exit code:
/// `0` if the line validated, `1` otherwise.
fn run_one(
    command: &str,
    builtins: &HashSet<&'static str>,
    path_bins: &HashMap<String, PathBuf>,
    cwd: &Path,
) -> i32 {
    let valid = process_line(command, "argv", builtins, path_bins, cwd, &mut StdinPrompt);
    i32::from(!valid)
}

/// Runs the interactive read-parse-validate-emit loop until EOF, SIGINT
/// stabilizes, or the (currently unreachable, since `exit` isn't executed)
/// should-exit flag is set.
///
/// # Errors
///
/// Returns a [`miette::Report`] if the history file or terminal raw mode
/// can't be acquired.
fn run_interactive(
    builtins: &HashSet<&'static str>,
    path_bins: &HashMap<String, PathBuf>,
    cwd: &Path,
) -> miette::Result<i32> {
    let history = history::HistoryStore::open_default().into_diagnostic()?;
    let mut driver = input_loop::InputLoop::new(format!("{APP_NAME}> "), history).into_diagnostic()?;

    loop {
        let mut line = String::new();
        match driver.read(&mut line).into_diagnostic()? {
            input_loop::ReadOutcome::Exit => break,
            input_loop::ReadOutcome::Line => {
                println!();
                if line.trim().is_empty() {
                    continue;
                }
                process_line(line.trim(), "stdin", builtins, path_bins, cwd, &mut StdinPrompt);
            }
        }
    }

    Ok(0)
}

/// Entry point shared by the binary: handles `--version`, `--command`, and
/// the interactive fallback, in that order.
///
/// # Errors
///
/// Returns a [`miette::Report`] describing an unrecoverable startup failure.
pub fn run(cli: Cli) -> miette::Result<i32> {
    if cli.version {
        println!("{APP_NAME} {APP_VERSION}");
        return Ok(0);
    }

    let is_tty = rustix::termios::isatty(&std::io::stdin());
    let _log_guard = logging::init(is_tty);

    let builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
    let path_bins = path_scan::scan_env();
    let cwd = std::env::current_dir().into_diagnostic()?;

    if let Some(raw_command) = &cli.command {
        let command = match cli::extract_quoted_command(raw_command) {
            Ok(c) => c,
            Err(err) => {
                let info = diagnostics::ErrorInfo { kind_message: err.to_string(), context: None };
                let spans = diagnostics::render(&info);
                eprint!("{}", diagnostics::render_to_string(&spans, diagnostics::no_color_requested()));
                return Ok(cli::EINVAL);
            }
        };
        return Ok(run_one(&command, &builtins, &path_bins, &cwd));
    }

    run_interactive(&builtins, &path_bins, &cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_process_line_valid_command_returns_true() {
        let builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        assert!(process_line("cd /tmp", "test", &builtins, &path_bins, &cwd, &mut AutoDeny));
    }

    #[test]
    fn test_process_line_invalid_command_returns_false() {
        let builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        assert!(!process_line("totally-not-a-real-binary-xyz", "test", &builtins, &path_bins, &cwd, &mut AutoDeny));
    }

    #[test]
    fn test_run_one_exit_codes() {
        let builtins: HashSet<&'static str> = BUILTINS.into_iter().collect();
        let path_bins = HashMap::new();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(run_one("cd /tmp", &builtins, &path_bins, &cwd), 0);
        assert_eq!(run_one("not-a-real-binary-xyz", &builtins, &path_bins, &cwd), 1);
    }
}
