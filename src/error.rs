//! The user-visible error taxonomy.
//!
//! Every variant's `Display` text is exactly what the shell prints to
//! stderr (or to a `2>` target).  Errors never terminate the shell; they
//! abort the offending pipeline and control returns to the prompt.

use std::io;

use thiserror::Error;

/// Diagnostics produced while preparing or running one input line.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A pipeline stage named a command that is neither a builtin nor
    /// resolvable on `PATH`.
    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// A redirection target could not be opened.
    #[error("Error preparing {path}: {source}")]
    Redirect {
        /// The redirection target as typed.
        path: String,
        /// The underlying open failure.
        source: io::Error,
    },

    /// `cd` was pointed at something that is not an existing directory.
    #[error("cd: {0}: No such file or directory")]
    NoSuchDirectory(String),

    /// A `history -r`/`-w`/`-a` file operation failed.
    #[error("history -{mode}: Cannot {op} {path}: {source}")]
    HistoryIo {
        /// The subcommand letter (`r`, `w`, or `a`).
        mode: char,
        /// The verb for the message (`read`, `write`, `append`).
        op: &'static str,
        /// The history file as typed.
        path: String,
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// Pipe creation failed while laying out a pipeline.
    #[error("Error creating pipe: {0}")]
    Pipe(io::Error),

    /// Forking or preparing a stage for launch failed.
    #[error("Error starting command {name}: {source}")]
    Start {
        /// The command name as typed.
        name: String,
        /// The underlying failure.
        source: io::Error,
    },
}
