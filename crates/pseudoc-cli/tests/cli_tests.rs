//! End-to-end tests driving the `pseudoc` binary (`spec.md` §6's CLI
//! host interface) through `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_program(dir: &TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).unwrap();
    path
}

#[test]
fn cli_help_lists_the_subcommands() {
    let mut cmd = Command::cargo_bin("pseudoc").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("repl"));
}

#[test]
fn cli_version_prints_something() {
    let mut cmd = Command::cargo_bin("pseudoc").unwrap();
    cmd.arg("--version");
    cmd.assert().success();
}

#[test]
fn run_executes_a_well_typed_program_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "add.pseudo", "DECLARE X : INTEGER\nX <- 2 + 3 * 4\nOUTPUT X\n");

    let mut cmd = Command::cargo_bin("pseudoc").unwrap();
    cmd.arg("run").arg(&path);
    cmd.assert().success().stdout(predicate::str::contains("14"));
}

#[test]
fn run_exits_with_code_four_on_a_runtime_error() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "div0.pseudo", "DECLARE X : INTEGER\nX <- 1 / 0\n");

    let mut cmd = Command::cargo_bin("pseudoc").unwrap();
    cmd.arg("run").arg(&path);
    cmd.assert().failure().code(4);
}

#[test]
fn run_exits_with_code_three_on_a_type_error() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "undeclared.pseudo", "X <- 1\n");

    let mut cmd = Command::cargo_bin("pseudoc").unwrap();
    cmd.arg("run").arg(&path);
    cmd.assert().failure().code(3);
}

#[test]
fn compile_emits_ir_text_by_default() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "out.pseudo", "DECLARE X : INTEGER\nOUTPUT X\n");

    let mut cmd = Command::cargo_bin("pseudoc").unwrap();
    cmd.arg("compile").arg(&path);
    cmd.assert().success().stdout(predicate::str::contains("OUTPUT"));
}

#[test]
fn compile_emit_ast_shows_the_parsed_tree() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "ast.pseudo", "DECLARE X : INTEGER\nOUTPUT X\n");

    let mut cmd = Command::cargo_bin("pseudoc").unwrap();
    cmd.arg("compile").arg(&path).arg("--emit").arg("ast");
    cmd.assert().success().stdout(predicate::str::contains("Declare"));
}

#[test]
fn compile_format_json_produces_a_json_document() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "json.pseudo", "DECLARE X : INTEGER\nOUTPUT X\n");

    let mut cmd = Command::cargo_bin("pseudoc").unwrap();
    cmd.arg("compile").arg(&path).arg("--format").arg("json");
    cmd.assert().success().stdout(predicate::str::contains("\"ir\""));
}

#[test]
fn run_accepts_queued_input_from_stdin_in_batch_mode() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "echo.pseudo", "DECLARE X : INTEGER\nINPUT X\nOUTPUT X\n");

    let mut cmd = Command::cargo_bin("pseudoc").unwrap();
    cmd.arg("run").arg(&path).write_stdin("99\n");
    cmd.assert().success().stdout(predicate::str::contains("99"));
}
