//! Executable resolution on `PATH`, and the cached listing that feeds
//! completion.

use std::collections::BTreeSet;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::debug;

/// How long a PATH scan stays fresh for completion purposes.
const CACHE_TTL: Duration = Duration::from_secs(1);

/// Resolve a command name against the current `PATH`.
///
/// Walks the segments left to right, skipping empty ones, and returns the
/// first `segment/name` that is a regular file executable by the current
/// process.  Execution always goes through here; the cache below is never
/// consulted for it.
pub fn resolve(name: &str) -> Option<PathBuf> {
    resolve_in(env::var_os("PATH").as_deref(), name)
}

pub(crate) fn resolve_in(path_var: Option<&OsStr>, name: &str) -> Option<PathBuf> {
    let path_var = path_var?;
    for dir in env::split_paths(path_var) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// A time-bounded snapshot of every executable basename on `PATH`.
///
/// The snapshot exists so that rapid successive completion keystrokes do
/// not re-scan the filesystem; it is refreshed when older than
/// [`CACHE_TTL`] and is advisory only.
pub struct ExecCache {
    snapshot: Option<(Instant, Vec<String>)>,
    ttl: Duration,
}

impl ExecCache {
    /// Create an empty cache; the first [`names`](Self::names) call scans.
    pub fn new() -> ExecCache {
        ExecCache {
            snapshot: None,
            ttl: CACHE_TTL,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_ttl(ttl: Duration) -> ExecCache {
        ExecCache { snapshot: None, ttl }
    }

    /// The sorted, deduplicated basenames of all `PATH` executables,
    /// rescanned when the snapshot has expired.
    pub fn names(&mut self) -> &[String] {
        self.names_in(env::var_os("PATH").as_deref())
    }

    pub(crate) fn names_in(&mut self, path_var: Option<&OsStr>) -> &[String] {
        let stale = match &self.snapshot {
            Some((taken, _)) => taken.elapsed() >= self.ttl,
            None => true,
        };
        if stale {
            let names = scan(path_var);
            debug!("rescanned PATH: {} executables", names.len());
            self.snapshot = Some((Instant::now(), names));
        }
        &self.snapshot.as_ref().unwrap().1
    }
}

impl Default for ExecCache {
    fn default() -> ExecCache {
        ExecCache::new()
    }
}

fn scan(path_var: Option<&OsStr>) -> Vec<String> {
    let mut names = BTreeSet::new();
    let Some(path_var) = path_var else {
        return Vec::new();
    };
    for dir in env::split_paths(path_var) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            if is_executable_file(&entry.path()) {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    names.into_iter().collect()
}
