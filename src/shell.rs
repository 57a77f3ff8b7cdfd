//! The shell itself: session state and the read-eval loop.
//!
//! Each accepted line is pushed to history, tokenized into stages, and
//! dispatched.  A lone builtin runs in the shell process so that `cd`,
//! `exit`, and the stateful `history` modes act on real shell state;
//! everything else goes through the pipeline executor.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use log::debug;
use rustyline::Editor;
use rustyline::config::{CompletionType, Config};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use crate::builtins::{self, Builtin};
use crate::complete::ShellHelper;
use crate::error::ShellError;
use crate::history::History;
use crate::pipeline;
use crate::redirect::{self, RedirSpec, SplitCommand};
use crate::tokenize;

type LineEditor = Editor<ShellHelper, DefaultHistory>;

/// What the evaluated line asks of the read loop.
enum Flow {
    Continue,
    Exit,
}

/// An interactive shell session.
pub struct Shell {
    history: History,
    /// `HISTFILE` as captured at construction; later environment changes
    /// do not affect exit persistence.
    histfile: Option<PathBuf>,
}

impl Shell {
    /// Create a session, capturing `HISTFILE` from the environment.
    pub fn new() -> Shell {
        Shell {
            history: History::new(),
            histfile: env::var_os("HISTFILE").map(PathBuf::from),
        }
    }

    /// Run the read-eval loop until `exit` or end of input.  Returns the
    /// process exit code.
    pub fn run(&mut self) -> i32 {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .build();
        let mut editor: LineEditor = match Editor::with_config(config) {
            Ok(editor) => editor,
            Err(e) => {
                eprintln!("minish: cannot initialize line editor: {e}");
                return 1;
            }
        };
        editor.set_helper(Some(ShellHelper::new()));
        self.hydrate_history(&mut editor);

        loop {
            match editor.readline("$ ") {
                Ok(line) => {
                    if let Flow::Exit = self.eval_line(&line, &mut editor) {
                        break;
                    }
                }
                // Both end-of-input and a terminal interrupt mean "persist
                // history and leave".
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
                Err(e) => {
                    eprintln!("minish: {e}");
                    self.persist_history();
                    return 1;
                }
            }
        }
        self.persist_history();
        0
    }

    /// Load `HISTFILE` into the log and the editor view.  Best-effort.
    fn hydrate_history(&mut self, editor: &mut LineEditor) {
        let Some(path) = self.histfile.clone() else {
            return;
        };
        match self.history.read_append(&path) {
            Ok(added) => {
                for line in added {
                    let _ = editor.add_history_entry(line.as_str());
                }
            }
            Err(e) => debug!("cannot read {}: {}", path.display(), e),
        }
    }

    /// Write the full log back to the captured `HISTFILE`.  Failures are
    /// deliberately silent.
    fn persist_history(&self) {
        if let Some(path) = &self.histfile {
            if let Err(e) = self.history.write_all(path) {
                debug!("cannot persist history to {}: {}", path.display(), e);
            }
        }
    }

    /// Evaluate one accepted input line.
    fn eval_line(&mut self, line: &str, editor: &mut LineEditor) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }
        // The line lands in history before any parsing, so a line whose
        // redirections fail is still recallable.
        self.history.push(line);
        let _ = editor.add_history_entry(line);

        let stages = tokenize::tokenize_pipeline(line);
        if stages.is_empty() {
            return Flow::Continue;
        }
        if stages.len() == 1 {
            let cmd = redirect::split_redirections(&stages[0]);
            if cmd.argv.is_empty() {
                return Flow::Continue;
            }
            if let Some(builtin) = Builtin::lookup(&cmd.argv[0]) {
                return self.run_builtin(builtin, cmd, editor);
            }
        }
        if let Err(e) = pipeline::execute(&stages, &self.history) {
            eprintln!("{e}");
        }
        Flow::Continue
    }

    /// Run a standalone builtin in the shell process, against its opened
    /// redirection targets.
    fn run_builtin(&mut self, builtin: Builtin, cmd: SplitCommand, editor: &mut LineEditor) -> Flow {
        let stdout_file = match cmd.stdout.as_ref().map(RedirSpec::open).transpose() {
            Ok(file) => file,
            Err(e) => {
                eprintln!(
                    "{}",
                    ShellError::Redirect {
                        path: cmd.stdout.unwrap().path,
                        source: e,
                    }
                );
                return Flow::Continue;
            }
        };
        let stderr_file = match cmd.stderr.as_ref().map(RedirSpec::open).transpose() {
            Ok(file) => file,
            Err(e) => {
                eprintln!(
                    "{}",
                    ShellError::Redirect {
                        path: cmd.stderr.unwrap().path,
                        source: e,
                    }
                );
                return Flow::Continue;
            }
        };
        let mut out: Box<dyn Write> = match stdout_file {
            Some(file) => Box::new(file),
            None => Box::new(io::stdout()),
        };
        let mut err: Box<dyn Write> = match stderr_file {
            Some(file) => Box::new(file),
            None => Box::new(io::stderr()),
        };

        let args = &cmd.argv[1..];
        let result = match builtin {
            Builtin::Exit => return Flow::Exit,
            Builtin::Echo => builtins::echo(args, &mut out),
            Builtin::Type => builtins::type_of(args, &mut out),
            Builtin::Pwd => builtins::pwd(&mut out),
            Builtin::Cd => builtins::cd(args, &mut err),
            Builtin::History => self.history_builtin(args, &mut out, &mut err, editor),
        };
        if let Err(e) = result {
            debug!("builtin {builtin:?} failed: {e}");
        }
        Flow::Continue
    }

    /// The `history` builtin's standalone modes.  `-r` also re-syncs the
    /// editor's history view with the merged log.
    fn history_builtin(
        &mut self,
        args: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
        editor: &mut LineEditor,
    ) -> io::Result<()> {
        if args.len() >= 2 {
            let path = args[1].clone();
            match args[0].as_str() {
                "-r" => {
                    return match self.history.read_append(&path) {
                        Ok(_) => {
                            let _ = editor.clear_history();
                            for entry in self.history.entries() {
                                let _ = editor.add_history_entry(entry.as_str());
                            }
                            Ok(())
                        }
                        Err(e) => writeln!(
                            err,
                            "{}",
                            ShellError::HistoryIo {
                                mode: 'r',
                                op: "read",
                                path,
                                source: e,
                            }
                        ),
                    };
                }
                "-w" => {
                    return match self.history.write_all(&path) {
                        Ok(()) => Ok(()),
                        Err(e) => writeln!(
                            err,
                            "{}",
                            ShellError::HistoryIo {
                                mode: 'w',
                                op: "write",
                                path,
                                source: e,
                            }
                        ),
                    };
                }
                "-a" => {
                    return match self.history.append_new(&path) {
                        Ok(()) => Ok(()),
                        Err(e) => writeln!(
                            err,
                            "{}",
                            ShellError::HistoryIo {
                                mode: 'a',
                                op: "append",
                                path,
                                source: e,
                            }
                        ),
                    };
                }
                _ => {}
            }
        }
        builtins::history_print(self.history.entries(), args, out)
    }
}

impl Default for Shell {
    fn default() -> Shell {
        Shell::new()
    }
}
