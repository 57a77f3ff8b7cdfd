//! Optional debug logging to the file named by `MINISH_LOG`.
//!
//! The shell owns the terminal, so diagnostics that are not part of its
//! user-visible output must never hit stdout or stderr; they go to a file
//! or nowhere.

use std::sync::Once;

use simplelog::{Config, LevelFilter, WriteLogger};

static INIT: Once = Once::new();

/// Initialize the file logger once per process.  Best-effort: without
/// `MINISH_LOG`, or when the file cannot be opened, logging stays off.
pub fn init() {
    INIT.call_once(|| {
        let Some(path) = std::env::var_os("MINISH_LOG") else {
            return;
        };
        let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        else {
            return;
        };
        let _ = WriteLogger::init(LevelFilter::Debug, Config::default(), file);
    });
}
