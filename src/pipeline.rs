//! Pipeline layout and execution.
//!
//! A pipeline of N stages gets exactly N−1 pipes, created before any fork
//! so every child sees the same descriptor table.  Launch proceeds left to
//! right; builtins fork and run their body in the child, externals fork
//! and exec the path resolved up front.  The parent's obligations are
//! strict: it drops every pipe end as soon as the last stage is launched
//! (a surviving write end would starve downstream readers of EOF), reaps
//! every child, and only then releases the redirection files it opened.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;

use log::debug;

use crate::builtins::{self, Builtin};
use crate::error::ShellError;
use crate::history::History;
use crate::lookup;
use crate::posix::{self, PreparedExec};
use crate::redirect::{self, RedirSpec};

/// One command of a pipeline, parsed and resolved.
#[derive(Debug)]
pub struct Stage {
    /// The command and its arguments; never empty.
    pub argv: Vec<String>,
    /// Redirection target for stdout, if any.  Wins over the pipe.
    pub stdout: Option<RedirSpec>,
    /// Redirection target for stderr, if any.
    pub stderr: Option<RedirSpec>,
    /// How the stage runs.
    pub kind: StageKind,
}

/// Whether a stage is handled in-process or spawned.
#[derive(Debug)]
pub enum StageKind {
    /// A shell builtin, run in a forked child.
    Builtin(Builtin),
    /// An external program with its resolved path.
    External(std::path::PathBuf),
}

/// Execute one pipeline given the token vectors of its stages.
///
/// An empty argv in any stage aborts silently with no external effects; a
/// resolution or redirection failure aborts with the corresponding
/// [`ShellError`] before any child is forked.  On return every launched
/// child has been reaped and every descriptor released.
pub fn execute(stage_tokens: &[Vec<String>], history: &History) -> Result<(), ShellError> {
    // Phase 1: parse and validate.
    let mut split = Vec::with_capacity(stage_tokens.len());
    for tokens in stage_tokens {
        let cmd = redirect::split_redirections(tokens);
        if cmd.argv.is_empty() {
            return Ok(());
        }
        split.push(cmd);
    }
    if split.is_empty() {
        return Ok(());
    }

    // Phase 2: resolve every external before any fd is opened.
    let mut stages = Vec::with_capacity(split.len());
    for cmd in split {
        let kind = match Builtin::lookup(&cmd.argv[0]) {
            Some(builtin) => StageKind::Builtin(builtin),
            None => match lookup::resolve(&cmd.argv[0]) {
                Some(path) => StageKind::External(path),
                None => return Err(ShellError::CommandNotFound(cmd.argv[0].clone())),
            },
        };
        stages.push(Stage {
            argv: cmd.argv,
            stdout: cmd.stdout,
            stderr: cmd.stderr,
            kind,
        });
    }

    // Phase 3: open redirection targets.  On failure the files opened so
    // far are closed by drop.
    let mut redirs: Vec<(Option<File>, Option<File>)> = Vec::with_capacity(stages.len());
    for stage in &stages {
        redirs.push((
            open_spec(stage.stdout.as_ref())?,
            open_spec(stage.stderr.as_ref())?,
        ));
    }

    // Phase 4: pipes, then launch left to right.
    let n = stages.len();
    let mut pipes = Vec::with_capacity(n - 1);
    for _ in 1..n {
        pipes.push(posix::pipe().map_err(ShellError::Pipe)?);
    }
    // Exec arguments are marshalled before forking.
    let mut prepared = Vec::with_capacity(n);
    for stage in &stages {
        prepared.push(match &stage.kind {
            StageKind::External(path) => {
                Some(PreparedExec::new(path, &stage.argv).map_err(|e| ShellError::Start {
                    name: stage.argv[0].clone(),
                    source: e,
                })?)
            }
            StageKind::Builtin(_) => None,
        });
    }

    debug!("launching pipeline of {} stage(s)", n);
    let mut pids = Vec::with_capacity(n);
    let mut launch_err = None;
    for (i, stage) in stages.iter().enumerate() {
        let stdin_fd = (i > 0).then(|| pipes[i - 1].0.as_raw_fd());
        let stdout_fd = match &redirs[i].0 {
            Some(file) => Some(file.as_raw_fd()),
            None if i + 1 < n => Some(pipes[i].1.as_raw_fd()),
            None => None,
        };
        let stderr_fd = redirs[i].1.as_ref().map(|file| file.as_raw_fd());
        match posix::fork() {
            Ok(Some(pid)) => {
                debug!("stage {} ({}) running as pid {}", i, stage.argv[0], pid);
                pids.push(pid);
            }
            Ok(None) => run_stage(
                stage,
                prepared[i].as_ref(),
                stdin_fd,
                stdout_fd,
                stderr_fd,
                &pipes,
                history,
            ),
            Err(e) => {
                launch_err = Some(ShellError::Start {
                    name: stage.argv[0].clone(),
                    source: e,
                });
                break;
            }
        }
    }

    // Phase 5: release the pipes before waiting, reap everything that was
    // launched, and keep the redirection files open until the last child
    // is gone.
    drop(pipes);
    for pid in pids {
        match posix::waitpid(pid) {
            Ok(status) => debug!("pid {pid} finished: {status:?}"),
            Err(e) => debug!("waitpid({pid}) failed: {e}"),
        }
    }
    drop(redirs);

    match launch_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn open_spec(spec: Option<&RedirSpec>) -> Result<Option<File>, ShellError> {
    match spec {
        Some(spec) => match spec.open() {
            Ok(file) => Ok(Some(file)),
            Err(e) => Err(ShellError::Redirect {
                path: spec.path.clone(),
                source: e,
            }),
        },
        None => Ok(None),
    }
}

/// The child side of a launched stage.  Re-plumbs the standard streams,
/// closes every pipe end, and never returns.
fn run_stage(
    stage: &Stage,
    prepared: Option<&PreparedExec>,
    stdin_fd: Option<i32>,
    stdout_fd: Option<i32>,
    stderr_fd: Option<i32>,
    pipes: &[(File, File)],
    history: &History,
) -> ! {
    let plumb = || -> io::Result<()> {
        if let Some(fd) = stdin_fd {
            posix::dup2(fd, 0)?;
        }
        if let Some(fd) = stdout_fd {
            posix::dup2(fd, 1)?;
        }
        if let Some(fd) = stderr_fd {
            posix::dup2(fd, 2)?;
        }
        // Close every pipe end, used or not; the copies in use now live on
        // 0/1/2.
        for (read, write) in pipes {
            let _ = posix::close(read.as_raw_fd());
            let _ = posix::close(write.as_raw_fd());
        }
        posix::reset_sigpipe()
    };
    if plumb().is_err() {
        posix::_exit(126);
    }
    match &stage.kind {
        StageKind::Builtin(builtin) => {
            let status = builtins::run_in_child(*builtin, &stage.argv[1..], history);
            posix::_exit(status);
        }
        StageKind::External(_) => {
            let error = prepared.expect("external stage prepared before fork").exec();
            eprintln!("Error starting command {}: {}", stage.argv[0], error);
            posix::_exit(127);
        }
    }
}
