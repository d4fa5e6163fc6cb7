// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Binary entry point: parses argv, wires up logging, and runs the
//! read-parse-validate-emit loop.

use clap::Parser as _;

fn main() -> miette::Result<()> {
    miette::set_panic_hook();

    let cli = better_shell::cli::Cli::parse();
    let exit_code = better_shell::run(cli)?;
    std::process::exit(exit_code);
}
