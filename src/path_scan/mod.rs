// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! One-shot scan of `$PATH`, building a filename-to-absolute-path map of
//! every regular, executable file found (`spec.md` §4.12).
//!
//! Grounded on `cmdr/src/rc/app.rs`'s startup-time environment probing, with
//! the walk itself hand-rolled (the corpus has no directory-walking crate
//! dependency to reuse for this single-level scan).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/bin";

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool { true }

/// Scans every directory in `path_var` (colon-separated), recording the
/// absolute path of each regular executable file keyed by filename.
/// Directories that can't be read are silently skipped.
#[must_use]
pub fn scan(path_var: &str) -> HashMap<String, PathBuf> {
    let mut map = HashMap::new();
    for dir in path_var.split(':').filter(|d| !d.is_empty()) {
        scan_dir(Path::new(dir), &mut map);
    }
    map
}

/// Convenience wrapper: reads `$PATH`, falling back to [`DEFAULT_PATH`] when
/// unset, and scans it.
#[must_use]
pub fn scan_env() -> HashMap<String, PathBuf> {
    let path_var = std::env::var("PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string());
    scan(&path_var)
}

fn scan_dir(dir: &Path, map: &mut HashMap<String, PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else { continue };
        if !metadata.is_file() || !is_executable(&metadata) {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else { continue };
        map.entry(name).or_insert_with(|| entry.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{self as stdfs, File};
    use std::io::Write as _;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = stdfs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        stdfs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn test_scan_finds_executable_and_skips_non_executable() {
        let dir = std::env::temp_dir().join(format!("better-shell-path-scan-{}", rand::random::<u64>()));
        stdfs::create_dir_all(&dir).unwrap();

        let exe_path = dir.join("mytool");
        File::create(&exe_path).unwrap().write_all(b"#!/bin/sh\n").unwrap();
        make_executable(&exe_path);

        let plain_path = dir.join("readme");
        File::create(&plain_path).unwrap().write_all(b"hi").unwrap();

        let map = scan(dir.to_str().unwrap());
        assert_eq!(map.get("mytool"), Some(&exe_path));
        assert!(!map.contains_key("readme"));

        stdfs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_scan_skips_unreadable_directory() {
        let map = scan("/definitely/not/a/real/path/xyz");
        assert!(map.is_empty());
    }

    #[test]
    fn test_scan_splits_on_colon() {
        let map = scan("/definitely/not/real:/also/not/real");
        assert!(map.is_empty());
    }
}
