//! End-to-end tests for the `conform` binary
//!
//! Each test builds a throwaway working directory with an `examples/` corpus and runs the
//! real binary in it. The program under test is `sh`, so every corpus entry is a small
//! shell script that prints something and exits with the status under test.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn workspace(cases: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("examples");
    fs::create_dir(&corpus).unwrap();
    for (name, script) in cases {
        fs::write(corpus.join(name), script).unwrap();
    }
    dir
}

fn conform(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_conform"))
        .args(["--executable", "sh"])
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn reports_pass_and_fail_with_diagnostic() {
    let dir = workspace(&[
        ("a.txt", "echo ok\nexit 0\n"),
        ("b.txt", "echo 'unexpected token at line 3'\necho 'second line'\nexit 2\n"),
    ]);

    let output = conform(dir.path(), &[]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "PASS examples/a.txt\nFAIL examples/b.txt\n\tunexpected token at line 3\n"
    );
}

#[test]
fn reports_in_sorted_order() {
    let dir = workspace(&[("z.txt", "exit 0\n"), ("a.txt", "exit 0\n"), ("m.txt", "exit 0\n")]);

    let output = conform(dir.path(), &[]);

    assert_eq!(
        stdout(&output),
        "PASS examples/a.txt\nPASS examples/m.txt\nPASS examples/z.txt\n"
    );
}

#[test]
fn unknown_status_passes_by_default() {
    let dir = workspace(&[("c.txt", "echo crashed\nexit 1\n")]);

    let output = conform(dir.path(), &[]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "PASS examples/c.txt\n");
}

#[test]
fn unknown_status_fails_when_requested() {
    let dir = workspace(&[("c.txt", "echo crashed\nexit 1\n")]);

    let output = conform(dir.path(), &["--unknown-status", "fail"]);

    assert_eq!(stdout(&output), "FAIL examples/c.txt\n\tcrashed\n");
}

#[test]
fn empty_corpus_is_a_clean_run() {
    let dir = workspace(&[]);

    let output = conform(dir.path(), &[]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_corpus_is_a_clean_run() {
    let dir = tempfile::tempdir().unwrap();

    let output = conform(dir.path(), &[]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn subdirectories_are_test_cases() {
    let dir = workspace(&[("a.txt", "")]);
    fs::create_dir(dir.path().join("examples").join("nested")).unwrap();
    fs::write(dir.path().join("examples").join(".hidden"), "").unwrap();

    // `ls` accepts both files and directories and exits 0 for each.
    let output = Command::new(env!("CARGO_BIN_EXE_conform"))
        .args(["--executable", "ls"])
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(stdout(&output), "PASS examples/a.txt\nPASS examples/nested\n");
}

#[test]
fn runs_are_byte_identical() {
    let dir = workspace(&[
        ("b.txt", "echo 'bad input'\nexit 2\n"),
        ("a.txt", "echo fine\n"),
        ("c.txt", "exit 7\n"),
    ]);

    let first = conform(dir.path(), &[]);
    let second = conform(dir.path(), &[]);

    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn exit_code_stays_zero_on_failures_by_default() {
    let dir = workspace(&[("b.txt", "exit 2\n")]);

    let output = conform(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "FAIL examples/b.txt\n\t\n");
}

#[test]
fn fail_exit_flag_signals_failures() {
    let dir = workspace(&[("b.txt", "exit 2\n")]);

    let output = conform(dir.path(), &["--fail-exit"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "FAIL examples/b.txt\n\t\n");
}

#[test]
fn missing_executable_is_fatal() {
    let dir = workspace(&[("a.txt", "exit 0\n")]);

    let output = Command::new(env!("CARGO_BIN_EXE_conform"))
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("small_parser.exe"), "stderr was: {stderr}");
}

#[test]
fn timeout_reports_hung_case_and_moves_on() {
    let dir = workspace(&[("a.txt", "echo waiting\nexec sleep 30\n"), ("b.txt", "echo ok\n")]);

    let output = conform(dir.path(), &["--timeout", "1"]);

    assert_eq!(stdout(&output), "FAIL examples/a.txt\n\twaiting\nPASS examples/b.txt\n");
}

#[test]
fn extra_failure_codes_from_flags() {
    let dir = workspace(&[("a.txt", "echo 'lexer gave up'\nexit 3\n")]);

    let output = conform(dir.path(), &["--failure", "3=Lexing failed"]);

    assert_eq!(stdout(&output), "FAIL examples/a.txt\n\tlexer gave up\n");
}

#[test]
fn custom_corpus_directory() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("cases");
    fs::create_dir(&corpus).unwrap();
    fs::write(corpus.join("x.txt"), "exit 0\n").unwrap();

    let output = conform(dir.path(), &["--corpus", "cases"]);

    assert_eq!(stdout(&output), "PASS cases/x.txt\n");
}

#[test]
fn timeout_keeps_diagnostic_when_child_leaves_sleeper_behind() {
    let dir = workspace(&[("a.txt", "echo waiting\nsleep 6\n"), ("b.txt", "sleep 6 &\necho ok\n")]);

    let output = conform(dir.path(), &["--timeout", "1"]);

    assert_eq!(stdout(&output), "FAIL examples/a.txt\n\twaiting\nPASS examples/b.txt\n");
}
