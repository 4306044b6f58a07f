//! Process runner tests against real child processes
//!
//! These spawn `sh`, so they only run on Unix-like hosts.

#![cfg(unix)]

use std::path::Path;

use cmake_harness::{filter_output, CommandRunner, Error, Invocation, ProcessRunner};
use tempfile::tempdir;

fn sh(script: &str, cwd: &Path) -> Invocation {
    Invocation::new("sh", cwd).args(["-c", script])
}

async fn run(script: &str) -> cmake_harness::Result<String> {
    let dir = tempdir().expect("Failed to create temp dir");
    ProcessRunner::new(false).run(&sh(script, dir.path())).await
}

#[tokio::test]
async fn test_success_returns_every_line_in_order() {
    let output = run("i=1; while [ $i -le 2000 ]; do echo \"line $i\"; i=$((i+1)); done")
        .await
        .unwrap();

    let expected: String = (1..=2000).map(|i| format!("line {}\n", i)).collect();
    assert_eq!(output, expected);
}

#[tokio::test]
async fn test_line_longer_than_pipe_buffer() {
    let output = run("head -c 200000 /dev/zero | tr '\\0' 'x'; echo").await.unwrap();

    assert_eq!(output.len(), 200_001);
    assert!(output[..200_000].bytes().all(|b| b == b'x'));
    assert!(output.ends_with('\n'));
}

#[tokio::test]
async fn test_heavy_output_on_both_streams_does_not_deadlock() {
    let output = run("i=0; while [ $i -lt 20000 ]; do echo \"out $i\"; echo \"err $i\" >&2; i=$((i+1)); done")
        .await
        .unwrap();

    let out: Vec<&str> = output.lines().filter(|l| l.starts_with("out ")).collect();
    let err: Vec<&str> = output.lines().filter(|l| l.starts_with("err ")).collect();
    assert_eq!(out.len(), 20_000);
    assert_eq!(err.len(), 20_000);
    assert_eq!(out[0], "out 0");
    assert_eq!(out[19_999], "out 19999");
    assert_eq!(err[19_999], "err 19999");
}

#[tokio::test]
async fn test_streams_merge_in_write_order() {
    for _ in 0..100 {
        let output = run("echo a; echo b >&2; echo c; echo d >&2; echo e").await.unwrap();
        assert_eq!(output, "a\nb\nc\nd\ne\n");
    }
}

#[tokio::test]
async fn test_heavy_alternating_streams_keep_exact_order() {
    let output = run("i=0; while [ $i -lt 5000 ]; do echo \"out $i\"; echo \"err $i\" >&2; i=$((i+1)); done")
        .await
        .unwrap();

    let expected: String = (0..5000)
        .map(|i| format!("out {}\nerr {}\n", i, i))
        .collect();
    assert_eq!(output, expected);
}

#[tokio::test]
async fn test_diagnostic_stays_next_to_its_compile_line() {
    let output = run(
        "echo '[ 50%] Building CXX object main.cpp.o'; \
         echo 'main.cpp:3: warning: unused variable' >&2; \
         echo '[100%] Linking CXX executable app'",
    )
    .await
    .unwrap();

    assert_eq!(
        filter_output(&output, "main.cpp"),
        "[ 50%] Building CXX object main.cpp.o\nmain.cpp:3: warning: unused variable"
    );
}

#[tokio::test]
async fn test_stderr_is_merged_into_output() {
    let output = run("echo to-stdout; echo to-stderr >&2").await.unwrap();
    assert!(output.contains("to-stdout\n"));
    assert!(output.contains("to-stderr\n"));
}

#[tokio::test]
async fn test_nonzero_exit_carries_captured_output() {
    let err = run("echo configuring; echo 'CMake Error: boom' >&2; exit 3")
        .await
        .unwrap_err();

    match &err {
        Error::CommandFailed { code, output, .. } => {
            assert_eq!(*code, Some(3));
            assert!(output.contains("configuring\n"));
            assert!(output.contains("CMake Error: boom\n"));
        }
        other => panic!("Expected CommandFailed, got {:?}", other),
    }
    assert_eq!(filter_output(err.captured_output().unwrap(), "Error"), "CMake Error: boom");
}

#[tokio::test]
async fn test_killed_process_has_no_exit_code() {
    let err = run("echo dying; kill -9 $$").await.unwrap_err();
    match err {
        Error::CommandFailed { code, output, .. } => {
            assert_eq!(code, None);
            assert_eq!(output, "dying\n");
        }
        other => panic!("Expected CommandFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced() {
    let output = run("printf '\\377built\\n'").await.unwrap();
    assert_eq!(output, "\u{FFFD}built\n");
}

#[tokio::test]
async fn test_unterminated_final_line_is_kept() {
    let output = run("printf 'first\\nlast'").await.unwrap();
    assert_eq!(output, "first\nlast");
}

#[tokio::test]
async fn test_runs_in_working_directory() {
    let dir = tempdir().unwrap();
    let output = ProcessRunner::new(false)
        .run(&sh("pwd -P", dir.path()))
        .await
        .unwrap();

    assert_eq!(
        Path::new(output.trim_end()),
        dir.path().canonicalize().unwrap()
    );
}

#[tokio::test]
async fn test_environment_override_reaches_child() {
    let dir = tempdir().unwrap();
    let invocation = sh("echo \"$HARNESS_PROBE\"", dir.path()).env("HARNESS_PROBE", "from-invocation");

    let output = ProcessRunner::new(false).run(&invocation).await.unwrap();
    assert_eq!(output, "from-invocation\n");
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let dir = tempdir().unwrap();
    let err = ProcessRunner::new(false)
        .run(&Invocation::new("cmake-harness-no-such-tool", dir.path()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Spawn { .. }));
}

#[tokio::test]
async fn test_verbose_runner_still_captures() {
    let dir = tempdir().unwrap();
    let output = ProcessRunner::new(true)
        .run(&sh("echo echoed", dir.path()))
        .await
        .unwrap();
    assert_eq!(output, "echoed\n");
}
