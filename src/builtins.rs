//! The builtin commands and their bodies.
//!
//! Bodies write through generic `Write` handles so the same code serves
//! both dispatch paths: standalone invocations run in the shell process
//! against the opened redirection targets, while pipeline members run in a
//! forked child whose standard streams have already been re-plumbed.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::error::ShellError;
use crate::history::History;
use crate::lookup;

/// Builtin names in sorted order, for completion.
pub const NAMES: [&str; 6] = ["cd", "echo", "exit", "history", "pwd", "type"];

/// The fixed set of commands implemented inside the shell.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Builtin {
    /// Print the arguments.
    Echo,
    /// Leave the shell.
    Exit,
    /// Classify a command name.
    Type,
    /// Print the working directory.
    Pwd,
    /// Change the working directory.
    Cd,
    /// Show or persist the command history.
    History,
}

impl Builtin {
    /// Look up a command word; only exact matches count.
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "echo" => Some(Builtin::Echo),
            "exit" => Some(Builtin::Exit),
            "type" => Some(Builtin::Type),
            "pwd" => Some(Builtin::Pwd),
            "cd" => Some(Builtin::Cd),
            "history" => Some(Builtin::History),
            _ => None,
        }
    }
}

/// Write the space-joined arguments and a newline.
pub fn echo(args: &[String], out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", args.join(" "))
}

/// Report whether a name is a builtin, a `PATH` executable, or unknown.
/// With no argument, writes nothing.
pub fn type_of(args: &[String], out: &mut dyn Write) -> io::Result<()> {
    let Some(name) = args.first() else {
        return Ok(());
    };
    if Builtin::lookup(name).is_some() {
        writeln!(out, "{name} is a shell builtin")
    } else if let Some(path) = lookup::resolve(name) {
        writeln!(out, "{} is {}", name, path.display())
    } else {
        writeln!(out, "{name}: not found")
    }
}

/// Write the current working directory.
pub fn pwd(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", env::current_dir()?.display())
}

/// Change the working directory.
///
/// `~` resolves to `$HOME`, absolute paths are used as-is, and anything
/// else is joined to the current directory.  A missing target leaves the
/// working directory unchanged and reports on `err`.  With no argument,
/// does nothing.
pub fn cd(args: &[String], err: &mut dyn Write) -> io::Result<()> {
    let Some(dir) = args.first() else {
        return Ok(());
    };
    let target = if dir == "~" {
        env::var_os("HOME").map(PathBuf::from)
    } else if dir.starts_with('/') {
        Some(PathBuf::from(dir))
    } else {
        env::current_dir().ok().map(|cwd| cwd.join(dir))
    };
    let changed = match target {
        Some(path) if path.is_dir() => env::set_current_dir(&path).is_ok(),
        _ => false,
    };
    if !changed {
        writeln!(err, "{}", ShellError::NoSuchDirectory(dir.clone()))?;
    }
    Ok(())
}

/// Print history entries with 1-based indices.
///
/// A positive integer argument limits output to the last that many
/// entries, indices preserved; any other argument is ignored.
pub fn history_print(entries: &[String], args: &[String], out: &mut dyn Write) -> io::Result<()> {
    let limit = args.first().and_then(|arg| arg.parse::<i64>().ok());
    let start = match limit {
        Some(n) => (entries.len() as i64 - n + 1).max(1) as usize,
        None => 1,
    };
    for (idx, entry) in entries.iter().enumerate().skip(start - 1) {
        writeln!(out, "    {}  {}", idx + 1, entry)?;
    }
    Ok(())
}

/// Run a builtin's body in a forked pipeline member and return its exit
/// status.  State changes made here die with the child; `history` only
/// prints (the file subcommands are a standalone affair), and `exit` just
/// ends the child.
pub fn run_in_child(builtin: Builtin, args: &[String], history: &History) -> u8 {
    let mut out = io::stdout();
    let mut err = io::stderr();
    let result = match builtin {
        Builtin::Exit => Ok(()),
        Builtin::Echo => echo(args, &mut out),
        Builtin::Type => type_of(args, &mut out),
        Builtin::Pwd => pwd(&mut out),
        Builtin::Cd => cd(args, &mut err),
        Builtin::History => history_print(history.entries(), args, &mut out),
    };
    let _ = out.flush();
    let _ = err.flush();
    if result.is_ok() { 0 } else { 1 }
}
