//! Test utilities for kms-ship
//!
//! Shared helpers for the unit test modules.

#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::logging::{LevelFormatter, Logger, MemorySink, Palette, Severity};

/// Plain-text logger capturing into memory.
pub fn memory_logger(minimum: Severity) -> (Arc<Logger>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::new(minimum, LevelFormatter::standard(&Palette::plain()), sink.clone());
    (Arc::new(logger), sink)
}

/// Write `content` to `name` inside `dir` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// A `/bin/sh` script body standing in for sops.
///
/// The script receives the sops arguments, so `$3` is the file to encrypt.
pub fn fake_sops_script(dir: &Path, body: &str) -> PathBuf {
    write_file(dir, "fake-sops.sh", format!("set -e\n{}\n", body).as_bytes())
}
