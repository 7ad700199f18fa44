use assert_cmd::Command;
use predicates::prelude::*;

fn replaunch() -> Command {
    Command::new(env!("CARGO_BIN_EXE_replaunch"))
}

#[test]
fn test_help_lists_run_command() {
    replaunch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_run_requires_a_program() {
    replaunch()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PROGRAM"));
}

#[test]
fn test_run_rejects_malformed_env_var() {
    replaunch()
        .args(["run", "clojure", "--env", "NOEQUALS"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    replaunch()
        .args(["--config", "/nonexistent/replaunch.yaml", "run", "clojure", "--no-repl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_no_repl_launch_returns_after_spawn() {
    let dir = tempfile::tempdir().unwrap();
    replaunch()
        .current_dir(dir.path())
        .args(["run", "sh", "--no-repl", "--", "-c", "exit 0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("started"));
}
