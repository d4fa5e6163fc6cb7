// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tracing initialization. Grounded on `tui/src/core/log/tracing_init.rs`'s
//! layer-composition shape, collapsed to the two writers this crate
//! actually needs: a rolling file sink when a tty is in use (raw mode must
//! never share stdout with log lines) and stderr otherwise.

use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

/// Keeps the non-blocking file writer alive; drop it only at process exit.
#[must_use]
pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

fn log_dir() -> PathBuf {
    std::env::var_os("XDG_HOME_CACHE")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("better")
        .join("better-shell")
        .join("logs")
}

/// Installs a `tracing-subscriber` registry filtered by `RUST_LOG` (default
/// `warn`). When `is_tty` is true, logs go to a rolling file under
/// `log_dir()`; otherwise they go to stderr.
pub fn init(is_tty: bool) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if is_tty {
        let dir = log_dir();
        if std::fs::create_dir_all(&dir).is_err() {
            return LogGuard { _file_guard: None };
        }
        let file_appender = tracing_appender::rolling::never(&dir, "better-shell.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let file_layer = tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false);
        let _ = tracing_subscriber::registry().with(filter).with(file_layer).try_init();
        LogGuard { _file_guard: Some(guard) }
    } else {
        let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_ansi(false);
        let _ = tracing_subscriber::registry().with(filter).with(stderr_layer).try_init();
        LogGuard { _file_guard: None }
    }
}
