//! Prefix completion over builtins, `PATH` executables, and filesystem
//! entries.
//!
//! The engine speaks the line editor's stateful callback protocol: it is
//! polled with `(prefix, state)` where `state` counts up from 0 within one
//! completion session.  The candidate list is computed once per prefix and
//! indexed by state on subsequent polls.

use std::cell::RefCell;
use std::fs;

use rustyline::Context;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;

use crate::builtins;
use crate::lookup::ExecCache;

/// The stateful completion engine.
pub struct CompletionEngine {
    cache: ExecCache,
    memo: Option<(String, Vec<String>)>,
}

impl CompletionEngine {
    /// Create an engine with an empty executable cache.
    pub fn new() -> CompletionEngine {
        CompletionEngine {
            cache: ExecCache::new(),
            memo: None,
        }
    }

    /// Answer one `(prefix, state)` poll.
    ///
    /// - no candidates: `None` for every state;
    /// - one candidate: the candidate plus a trailing space at state 0,
    ///   `None` afterwards;
    /// - several candidates: their longest common prefix at state 0 when
    ///   it strictly extends the input (then nothing more), otherwise the
    ///   state-th candidate until the list is exhausted.
    pub fn complete(&mut self, prefix: &str, state: usize) -> Option<String> {
        let cached = matches!(&self.memo, Some((p, _)) if p == prefix);
        if !cached {
            let candidates = if prefix.contains('/') {
                fs_candidates(prefix)
            } else {
                command_candidates(prefix, self.cache.names())
            };
            self.memo = Some((prefix.to_string(), candidates));
        }
        let candidates = &self.memo.as_ref().unwrap().1;
        select(candidates, prefix, state)
    }
}

impl Default for CompletionEngine {
    fn default() -> CompletionEngine {
        CompletionEngine::new()
    }
}

/// The protocol core, separated from candidate gathering.
pub(crate) fn select(candidates: &[String], prefix: &str, state: usize) -> Option<String> {
    match candidates.len() {
        0 => None,
        1 => (state == 0).then(|| format!("{} ", candidates[0])),
        _ => {
            let lcp = longest_common_prefix(candidates);
            if lcp.len() > prefix.len() {
                (state == 0).then_some(lcp)
            } else {
                candidates.get(state).cloned()
            }
        }
    }
}

/// Builtin names and cached executables matching the prefix, sorted and
/// deduplicated; a builtin shadows a `PATH` entry of the same name.
pub(crate) fn command_candidates(prefix: &str, path_names: &[String]) -> Vec<String> {
    let mut candidates: Vec<String> = builtins::NAMES
        .iter()
        .filter(|name| name.starts_with(prefix))
        .map(|name| name.to_string())
        .collect();
    candidates.extend(
        path_names
            .iter()
            .filter(|name| name.starts_with(prefix) && !builtins::NAMES.contains(&name.as_str()))
            .cloned(),
    );
    candidates.sort();
    candidates.dedup();
    candidates
}

/// Filesystem candidates for a prefix containing a path separator.
///
/// The prefix is split at its last `/`; an empty directory part means the
/// filesystem root.  Matching entries are rejoined with the directory part
/// so the result can replace the prefix in the input line.
pub(crate) fn fs_candidates(prefix: &str) -> Vec<String> {
    let split = prefix.rfind('/').unwrap();
    let (dirpart, basepart) = (&prefix[..split], &prefix[split + 1..]);
    let dirpath = if dirpart.is_empty() { "/" } else { dirpart };
    let Ok(entries) = fs::read_dir(dirpath) else {
        return Vec::new();
    };
    let mut candidates: Vec<String> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(basepart))
        .map(|name| format!("{dirpart}/{name}"))
        .collect();
    candidates.sort();
    candidates
}

fn longest_common_prefix(items: &[String]) -> String {
    let mut prefix = items[0].clone();
    for item in &items[1..] {
        let common = prefix
            .chars()
            .zip(item.chars())
            .take_while(|(a, b)| a == b)
            .count();
        let bytes = prefix.chars().take(common).map(char::len_utf8).sum();
        prefix.truncate(bytes);
        if prefix.is_empty() {
            break;
        }
    }
    prefix
}

/// Adapts the engine to the line editor.
///
/// The editor calls [`Completer::complete`] with the whole line; the word
/// under the cursor becomes the engine's prefix, and the engine is driven
/// through its states to collect every candidate for display.
pub struct ShellHelper {
    engine: RefCell<CompletionEngine>,
}

impl ShellHelper {
    /// Create a helper with a fresh engine.
    pub fn new() -> ShellHelper {
        ShellHelper {
            engine: RefCell::new(CompletionEngine::new()),
        }
    }
}

impl Default for ShellHelper {
    fn default() -> ShellHelper {
        ShellHelper::new()
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let prefix = &line[start..pos];
        let mut engine = self.engine.borrow_mut();
        let mut pairs = Vec::new();
        for state in 0.. {
            match engine.complete(prefix, state) {
                Some(candidate) => pairs.push(Pair {
                    display: candidate.clone(),
                    replacement: candidate,
                }),
                None => break,
            }
        }
        Ok((start, pairs))
    }
}

impl Helper for ShellHelper {}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}
