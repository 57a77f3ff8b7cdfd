//! Extraction of redirection operators from a stage's token stream.

use std::fs::{File, OpenOptions};
use std::io;

/// Which standard stream a redirection applies to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Operators in match order.  Longer forms precede the forms they would
/// otherwise be mistaken for (`2>>` before `2>`, `>>` before `>`).
const OPERATORS: [(&str, Stream, bool); 6] = [
    ("1>>", Stream::Stdout, true),
    ("2>>", Stream::Stderr, true),
    (">>", Stream::Stdout, true),
    ("1>", Stream::Stdout, false),
    ("2>", Stream::Stderr, false),
    (">", Stream::Stdout, false),
];

/// One redirection target: where the stream goes and whether to append.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RedirSpec {
    /// The target path as typed.
    pub path: String,
    /// Append instead of truncating.
    pub append: bool,
}

impl RedirSpec {
    /// Open the target for writing, truncating or appending as requested.
    pub fn open(&self) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&self.path)
    }
}

/// A stage's tokens with the redirections peeled off.
#[derive(Debug, Default)]
pub struct SplitCommand {
    /// The remaining words, in order.
    pub argv: Vec<String>,
    /// The stdout redirection, if any.  Later operators overwrite earlier
    /// ones.
    pub stdout: Option<RedirSpec>,
    /// The stderr redirection, if any.
    pub stderr: Option<RedirSpec>,
}

/// Split a stage's tokens into argv and redirection specs.
///
/// Each operator is recognized both as a standalone token (the following
/// token is the target; with no following token the operator is silently
/// discarded) and as a prefix of a longer token (the remainder is the
/// target).
pub fn split_redirections(tokens: &[String]) -> SplitCommand {
    let mut cmd = SplitCommand::default();
    let mut iter = tokens.iter();
    'tokens: while let Some(token) = iter.next() {
        for &(op, stream, append) in &OPERATORS {
            let path = if token.as_str() == op {
                match iter.next() {
                    Some(target) => target.clone(),
                    None => continue 'tokens,
                }
            } else if let Some(rest) = token.strip_prefix(op) {
                rest.to_string()
            } else {
                continue;
            };
            let spec = RedirSpec { path, append };
            match stream {
                Stream::Stdout => cmd.stdout = Some(spec),
                Stream::Stderr => cmd.stderr = Some(spec),
            }
            continue 'tokens;
        }
        cmd.argv.push(token.clone());
    }
    cmd
}
