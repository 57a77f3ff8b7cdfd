//! The in-memory command history and its file operations.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// An append-only log of the lines entered this session, plus the
/// watermark used by `history -a`: the number of entries already persisted
/// by a previous append.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
    appended: usize,
}

impl History {
    /// Create an empty history.
    pub fn new() -> History {
        History::default()
    }

    /// Record a line.  Lines that are empty after trimming surrounding
    /// whitespace are ignored; accepted lines are stored as typed.
    pub fn push(&mut self, line: &str) {
        if !line.trim().is_empty() {
            self.entries.push(line.to_string());
        }
    }

    /// The recorded lines, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of recorded lines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many entries a previous [`append_new`](Self::append_new) has
    /// already persisted.
    pub fn watermark(&self) -> usize {
        self.appended
    }

    /// Overwrite `path` with the full log, one entry per line.
    pub fn write_all(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(entry);
            content.push('\n');
        }
        fs::write(path, content)
    }

    /// Append each non-empty line of `path` to the log, returning the
    /// lines that were added so the caller can update the editor's view.
    pub fn read_append(&mut self, path: impl AsRef<Path>) -> io::Result<Vec<String>> {
        let content = fs::read_to_string(path)?;
        let added: Vec<String> = content
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        self.entries.extend(added.iter().cloned());
        Ok(added)
    }

    /// Append the entries past the watermark to `path`, then advance the
    /// watermark.  Calling this again without new pushes appends nothing.
    pub fn append_new(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        for entry in &self.entries[self.appended..] {
            writeln!(file, "{entry}")?;
        }
        self.appended = self.entries.len();
        Ok(())
    }
}
