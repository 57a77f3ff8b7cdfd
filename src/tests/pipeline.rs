use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::error::ShellError;
use crate::history::History;
use crate::pipeline::execute;

fn stage(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn single_external_with_stdout_redirect() {
    let tmpdir = TempDir::new().unwrap();
    let out = tmpdir.path().join("out");
    let stages = vec![stage(&["sh", "-c", "printf foo", ">", out.to_str().unwrap()])];
    execute(&stages, &History::new()).unwrap();
    assert_eq!(read(&out), "foo");
}

#[test]
fn builtin_stage_runs_in_a_child() {
    let tmpdir = TempDir::new().unwrap();
    let out = tmpdir.path().join("out");
    let stages = vec![stage(&["echo", "foo", ">", out.to_str().unwrap()])];
    execute(&stages, &History::new()).unwrap();
    assert_eq!(read(&out), "foo\n");
}

#[test]
fn two_external_stages_share_a_pipe() {
    let tmpdir = TempDir::new().unwrap();
    let out = tmpdir.path().join("out");
    let stages = vec![
        stage(&["printf", "a\nb\nc\n"]),
        stage(&["wc", "-l", ">", out.to_str().unwrap()]),
    ];
    execute(&stages, &History::new()).unwrap();
    assert_eq!(read(&out).trim(), "3");
}

#[test]
fn builtin_feeds_an_external_through_the_pipe() {
    let tmpdir = TempDir::new().unwrap();
    let out = tmpdir.path().join("out");
    let stages = vec![
        stage(&["echo", "one"]),
        stage(&["wc", "-c", ">", out.to_str().unwrap()]),
    ];
    execute(&stages, &History::new()).unwrap();
    assert_eq!(read(&out).trim(), "4");
}

#[test]
fn three_stage_pipeline() {
    let tmpdir = TempDir::new().unwrap();
    let out = tmpdir.path().join("out");
    let stages = vec![
        stage(&["printf", "foo\nbar\nfoo\n"]),
        stage(&["sort"]),
        stage(&["uniq", ">", out.to_str().unwrap()]),
    ];
    execute(&stages, &History::new()).unwrap();
    assert_eq!(read(&out), "bar\nfoo\n");
}

#[test]
fn stdout_redirect_wins_over_the_pipe() {
    let tmpdir = TempDir::new().unwrap();
    let first = tmpdir.path().join("first");
    let second = tmpdir.path().join("second");
    // Stage 0 writes to its file; cat then reads an immediate EOF, which
    // also proves no write end of the pipe is left open anywhere.
    let stages = vec![
        stage(&["sh", "-c", "printf diverted", ">", first.to_str().unwrap()]),
        stage(&["cat", ">", second.to_str().unwrap()]),
    ];
    execute(&stages, &History::new()).unwrap();
    assert_eq!(read(&first), "diverted");
    assert_eq!(read(&second), "");
}

#[test]
fn append_accumulates_across_runs() {
    let tmpdir = TempDir::new().unwrap();
    let out = tmpdir.path().join("log");
    let stages = vec![stage(&["sh", "-c", "printf x", ">>", out.to_str().unwrap()])];
    execute(&stages, &History::new()).unwrap();
    execute(&stages, &History::new()).unwrap();
    assert_eq!(read(&out), "xx");
}

#[test]
fn stderr_redirect_captures_diagnostics() {
    let tmpdir = TempDir::new().unwrap();
    let errfile = tmpdir.path().join("err");
    let stages = vec![stage(&[
        "sh",
        "-c",
        "echo oops >&2",
        "2>",
        errfile.to_str().unwrap(),
    ])];
    execute(&stages, &History::new()).unwrap();
    assert_eq!(read(&errfile), "oops\n");
}

#[test]
fn history_builtin_prints_the_snapshot_through_a_pipe() {
    let tmpdir = TempDir::new().unwrap();
    let out = tmpdir.path().join("out");
    let mut history = History::new();
    history.push("alpha");
    history.push("beta");
    let stages = vec![
        stage(&["history"]),
        stage(&["cat", ">", out.to_str().unwrap()]),
    ];
    execute(&stages, &history).unwrap();
    assert_eq!(read(&out), "    1  alpha\n    2  beta\n");
}

#[test]
fn unknown_command_aborts_before_side_effects() {
    let tmpdir = TempDir::new().unwrap();
    let out = tmpdir.path().join("never");
    let stages = vec![
        stage(&["echo", "hi"]),
        stage(&["no-such-cmd-xyz", ">", out.to_str().unwrap()]),
    ];
    let err = execute(&stages, &History::new()).unwrap_err();
    assert!(matches!(err, ShellError::CommandNotFound(_)));
    assert_eq!(err.to_string(), "no-such-cmd-xyz: command not found");
    assert!(!out.exists());
}

#[test]
fn empty_argv_aborts_silently() {
    let tmpdir = TempDir::new().unwrap();
    let out = tmpdir.path().join("never");
    // The second stage is nothing but a discarded operator, so its argv
    // is empty and the whole pipeline must not run.
    let stages = vec![
        stage(&["echo", "hi", ">", out.to_str().unwrap()]),
        stage(&[">"]),
    ];
    execute(&stages, &History::new()).unwrap();
    assert!(!out.exists());
}

#[test]
fn unopenable_redirect_aborts_the_pipeline() {
    let stages = vec![stage(&["echo", "hi", ">", "/no/such/dir-xyz/out"])];
    let err = execute(&stages, &History::new()).unwrap_err();
    assert!(matches!(err, ShellError::Redirect { .. }));
    assert!(
        err.to_string().starts_with("Error preparing /no/such/dir-xyz/out:"),
        "unexpected message: {err}"
    );
}

#[test]
fn later_redirect_wins_within_a_stage() {
    let tmpdir = TempDir::new().unwrap();
    let first = tmpdir.path().join("first");
    let second = tmpdir.path().join("second");
    let stages = vec![stage(&[
        "echo",
        "picked",
        ">",
        first.to_str().unwrap(),
        ">",
        second.to_str().unwrap(),
    ])];
    execute(&stages, &History::new()).unwrap();
    // The earlier target is never even created.
    assert!(!first.exists());
    assert_eq!(read(&second), "picked\n");
}

#[test]
fn pwd_appends_twice() {
    let tmpdir = TempDir::new().unwrap();
    let log = tmpdir.path().join("log");
    let stages = vec![stage(&["pwd", ">>", log.to_str().unwrap()])];
    execute(&stages, &History::new()).unwrap();
    execute(&stages, &History::new()).unwrap();
    let cwd = std::env::current_dir().unwrap();
    let expected = format!("{}\n{}\n", cwd.display(), cwd.display());
    assert_eq!(read(&log), expected);
}
