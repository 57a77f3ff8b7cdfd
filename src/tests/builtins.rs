use std::env;

use crate::builtins::{Builtin, cd, echo, history_print, pwd, type_of};

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn capture(run: impl FnOnce(&mut Vec<u8>)) -> String {
    let mut buf = Vec::new();
    run(&mut buf);
    String::from_utf8(buf).unwrap()
}

#[test]
fn lookup_is_exact() {
    assert_eq!(Builtin::lookup("echo"), Some(Builtin::Echo));
    assert_eq!(Builtin::lookup("history"), Some(Builtin::History));
    assert_eq!(Builtin::lookup("Echo"), None);
    assert_eq!(Builtin::lookup("ech"), None);
    assert_eq!(Builtin::lookup("ls"), None);
}

#[test]
fn echo_joins_with_spaces() {
    let out = capture(|buf| echo(&owned(&["hello", "world"]), buf).unwrap());
    assert_eq!(out, "hello world\n");
}

#[test]
fn echo_without_args_prints_empty_line() {
    let out = capture(|buf| echo(&[], buf).unwrap());
    assert_eq!(out, "\n");
}

#[test]
fn type_reports_builtin() {
    let out = capture(|buf| type_of(&owned(&["echo"]), buf).unwrap());
    assert_eq!(out, "echo is a shell builtin\n");
}

#[test]
fn type_reports_external_path() {
    // `sh` is present in any environment these tests run in.
    let out = capture(|buf| type_of(&owned(&["sh"]), buf).unwrap());
    assert!(out.starts_with("sh is /"), "unexpected output: {out:?}");
    assert!(out.trim_end().ends_with("/sh"), "unexpected output: {out:?}");
}

#[test]
fn type_reports_unknown() {
    let out = capture(|buf| type_of(&owned(&["no-such-cmd-xyz"]), buf).unwrap());
    assert_eq!(out, "no-such-cmd-xyz: not found\n");
}

#[test]
fn type_without_args_prints_nothing() {
    let out = capture(|buf| type_of(&[], buf).unwrap());
    assert_eq!(out, "");
}

#[test]
fn pwd_prints_current_dir() {
    let out = capture(|buf| pwd(buf).unwrap());
    assert_eq!(out.trim_end(), env::current_dir().unwrap().to_str().unwrap());
}

#[test]
fn cd_missing_directory_reports_and_stays() {
    let before = env::current_dir().unwrap();
    let err = capture(|buf| cd(&owned(&["/no/such/dir-xyz"]), buf).unwrap());
    assert_eq!(err, "cd: /no/such/dir-xyz: No such file or directory\n");
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn cd_relative_missing_directory_reports_typed_name() {
    let err = capture(|buf| cd(&owned(&["definitely-not-here"]), buf).unwrap());
    assert_eq!(err, "cd: definitely-not-here: No such file or directory\n");
}

#[test]
fn cd_without_args_is_a_noop() {
    let before = env::current_dir().unwrap();
    let err = capture(|buf| cd(&[], buf).unwrap());
    assert_eq!(err, "");
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn history_print_formats_indices() {
    let entries = owned(&["one", "two", "three"]);
    let out = capture(|buf| history_print(&entries, &[], buf).unwrap());
    assert_eq!(out, "    1  one\n    2  two\n    3  three\n");
}

#[test]
fn history_print_limits_to_last_n() {
    let entries = owned(&["one", "two", "three"]);
    let out = capture(|buf| history_print(&entries, &owned(&["2"]), buf).unwrap());
    assert_eq!(out, "    2  two\n    3  three\n");
}

#[test]
fn history_print_limit_larger_than_log_shows_all() {
    let entries = owned(&["one", "two"]);
    let out = capture(|buf| history_print(&entries, &owned(&["10"]), buf).unwrap());
    assert_eq!(out, "    1  one\n    2  two\n");
}

#[test]
fn history_print_ignores_non_integer_argument() {
    let entries = owned(&["one", "two"]);
    let out = capture(|buf| history_print(&entries, &owned(&["soon"]), buf).unwrap());
    assert_eq!(out, "    1  one\n    2  two\n");
}
