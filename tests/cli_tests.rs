// Binary surface: argument handling, startup errors, analyze-only runs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_no_arguments_prints_usage_and_succeeds() {
    let mut cmd = Command::cargo_bin("compile-timer").unwrap();
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("usage: compile-timer"));
}

#[test]
fn test_extra_argument_prints_usage_and_succeeds() {
    let mut cmd = Command::cargo_bin("compile-timer").unwrap();
    cmd.args(["/tmp", "clang++", "surplus"])
        .assert()
        .success()
        .stdout(predicate::str::contains("usage: compile-timer"));
}

#[test]
fn test_unknown_flag_is_rejected() {
    let mut cmd = Command::cargo_bin("compile-timer").unwrap();
    cmd.args(["--bogus", "/tmp", "clang++"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("usage: compile-timer").not())
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn test_missing_build_graph_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("compile-timer").unwrap();
    cmd.arg(dir.path())
        .arg("/opt/llvm/bin/clang++")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not contain a build.ninja"));
}

#[test]
fn test_config_block_shows_derived_compilers() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("compile-timer").unwrap();
    cmd.arg(dir.path())
        .arg("/opt/llvm/bin/clang")
        .assert()
        .stdout(predicate::str::contains("clang bin:   /opt/llvm/bin/clang\n"))
        .stdout(predicate::str::contains("clang++ bin: /opt/llvm/bin/clang++"));
}

#[test]
fn test_analyze_only_writes_reports() {
    let dir = TempDir::new().unwrap();
    let build = dir.path();
    fs::write(build.join("build.ninja"), "").unwrap();
    fs::write(
        build.join("compile-timer.json"),
        r#"{
            "clang++ -o main.cpp.o -c main.cpp": { "type": "CompileCpp", "elapsedSeconds": 0.5 },
            "clang++ main.cpp.o -o app -Wl,-O1": { "type": "LinkCpp", "elapsedSeconds": 0.25 }
        }"#,
    )
    .unwrap();
    fs::write(
        build.join("main.cpp.json"),
        r#"{ "traceEvents": [
            { "ph": "X", "name": "Source", "ts": 0, "dur": 2000, "args": { "detail": "/gone/main.cpp" } },
            { "ph": "X", "name": "Total Frontend", "ts": 0, "dur": 3000000 }
        ] }"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("compile-timer").unwrap();
    cmd.arg("--analyze-only")
        .arg(build)
        .arg("clang++")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Build Time: 0.750 sec"))
        .stdout(predicate::str::contains("3.000 sec - Total Frontend"));

    let commands = fs::read_to_string(build.join("ct-commands.csv")).unwrap();
    assert!(commands.contains("main.cpp,Compile C++,500\n"));
    assert!(commands.contains("app,Link C++,250\n"));

    let headers = fs::read_to_string(build.join("ct-headers.csv")).unwrap();
    assert!(headers.contains("/gone/main.cpp,1,2.000,2.000,2.000,2.000\n"));

    let folders = fs::read_to_string(build.join("ct-header-folders.csv")).unwrap();
    assert!(folders.contains("/gone,2.000\n"));
}

#[test]
fn test_analyze_only_missing_trace_fails() {
    let dir = TempDir::new().unwrap();
    let build = dir.path();
    fs::write(build.join("build.ninja"), "").unwrap();
    fs::write(
        build.join("compile-timer.json"),
        r#"{ "clang -o a.o -c a.c": { "type": "CompileC", "elapsedSeconds": 0.1 } }"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("compile-timer").unwrap();
    cmd.arg("--analyze-only")
        .arg(build)
        .arg("clang")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no time trace file found"));
}
