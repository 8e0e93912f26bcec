//! End-to-end tests for command and pipeline execution against real programs
//!
//! Tests cover:
//! - Live tee of output to the destination plus the returned capture
//! - Fail-fast status evaluation and diagnostics
//! - stdin feeding, including children that exit without reading
//! - Pipelines: chaining, first-failure selection, spawn failures
#![cfg(unix)]

use safexec::{
    Command, Output, PipelineOptions, ProcessStatus, RunOptions, Runner, RunnerError, SpawnOptions,
    StageErrors, StageInput,
};
use tempfile::TempDir;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn runner() -> Runner<Vec<u8>> {
    Runner::new(Vec::new())
}

fn transcript(runner: Runner<Vec<u8>>) -> String {
    String::from_utf8(runner.into_inner()).unwrap()
}

// ============================================================================
// Single commands
// ============================================================================

#[test]
fn test_echo_returns_and_tees_output() -> Result<()> {
    let mut runner = runner();
    let output = runner.run(
        &Command::new("echo").arg("hello"),
        &RunOptions::default(),
    )?;

    assert_eq!(output, Output::Text("hello\n".to_string()));
    assert_eq!(
        transcript(runner),
        "Running Command:\n\"echo\" \"hello\"\nhello\n"
    );
    Ok(())
}

#[test]
fn test_false_fails_with_exit_code_one() {
    let mut runner = runner();
    let err = runner
        .run(&Command::new("false"), &RunOptions::default())
        .unwrap_err();

    match &err {
        RunnerError::ExecutionFailed {
            index,
            command,
            status,
        } => {
            assert_eq!(*index, 0);
            assert_eq!(command.program_name(), "false");
            assert_eq!(*status, ProcessStatus::Exited { code: 1 });
        }
        other => panic!("Expected ExecutionFailed, got {other:?}"),
    }
    assert!(transcript(runner).ends_with("Process Exited normally. Exit status:1\n"));
}

#[test]
fn test_quiet_failure_writes_nothing() {
    let mut runner = runner();
    let err = runner
        .run(
            &Command::new("sh").args(["-c", "echo noisy; exit 4"]),
            &RunOptions::new().quiet(true),
        )
        .unwrap_err();

    assert_eq!(err.status(), Some(&ProcessStatus::Exited { code: 4 }));
    assert!(runner.into_inner().is_empty());
}

#[test]
fn test_stderr_is_merged_into_capture() -> Result<()> {
    let output = runner().run(
        &Command::new("sh").args(["-c", "echo out; echo err >&2"]),
        &RunOptions::new().quiet(true),
    )?;

    let text = output.as_text().unwrap();
    assert!(text.contains("out\n"));
    assert!(text.contains("err\n"));
    Ok(())
}

#[test]
fn test_stdin_data_is_delivered() -> Result<()> {
    let output = runner().run(
        &Command::new("tr").args(["a-z", "A-Z"]),
        &RunOptions::new().quiet(true).stdin_data("shout\n"),
    )?;
    assert_eq!(output.as_text(), Some("SHOUT\n"));
    Ok(())
}

#[test]
fn test_child_exiting_before_reading_input_is_not_an_error() -> Result<()> {
    // Far more than a pipe buffer, so the write side must see EPIPE
    let data = vec![b'x'; 4 * 1024 * 1024];
    let output = runner().run(
        &Command::new("true"),
        &RunOptions::new().quiet(true).stdin_data(data),
    )?;
    assert!(output.is_empty());
    Ok(())
}

#[test]
fn test_large_output_does_not_deadlock_with_large_input() -> Result<()> {
    let data: Vec<u8> = (0..2 * 1024 * 1024).map(|i| b'a' + (i % 26) as u8).collect();
    let output = runner().run(
        &Command::new("cat"),
        &RunOptions::new().quiet(true).binary(true).stdin_data(data.clone()),
    )?;
    assert_eq!(output.as_bytes(), data.as_slice());
    Ok(())
}

#[test]
fn test_binary_output_is_preserved() -> Result<()> {
    let output = runner().run(
        &Command::new("printf").arg("\\377\\000\\001"),
        &RunOptions::new().quiet(true).binary(true),
    )?;
    assert_eq!(output, Output::Binary(vec![0xff, 0x00, 0x01]));
    Ok(())
}

#[test]
fn test_text_mode_returns_invalid_utf8_unchanged() -> Result<()> {
    let mut runner = runner();
    let output = runner.run(
        &Command::new("printf").arg("ok\\377\\n"),
        &RunOptions::default(),
    )?;

    assert_eq!(output.as_text(), Some("ok\u{fffd}\n"));
    assert_eq!(output.as_bytes(), b"ok\xff\n");
    assert!(runner.into_inner().ends_with(b"ok\xff\n"));
    Ok(())
}

#[test]
fn test_signalled_child_is_abnormal() {
    let err = runner()
        .run(
            &Command::new("sh").args(["-c", "kill -9 $$"]),
            &RunOptions::new().quiet(true),
        )
        .unwrap_err();

    let status = err.status().copied().unwrap();
    assert!(!status.terminated_normally());
    assert_eq!(status.signal(), Some(9));
}

#[test]
fn test_abnormal_diagnostic_text() {
    let mut runner = runner();
    let _ = runner.run(
        &Command::new("sh").args(["-c", "kill -9 $$"]),
        &RunOptions::default(),
    );

    let text = transcript(runner);
    assert!(text.contains("Process exited abnormally:"), "{text}");
    assert!(text.contains("Raw POSIX Status:"), "{text}");
}

#[test]
fn test_spawn_failure() {
    let err = runner()
        .run(
            &Command::new("safexec_no_such_program_4242"),
            &RunOptions::new().quiet(true),
        )
        .unwrap_err();
    assert!(matches!(err, RunnerError::Spawn { .. }), "{err:?}");
}

#[test]
fn test_spawn_options_reach_the_child() -> Result<()> {
    let dir = TempDir::new()?;
    let output = runner().run(
        &Command::new("sh").args(["-c", "pwd; printf '%s' \"$SAFEXEC_TEST_VAR\""]),
        &RunOptions::new().quiet(true).spawn(
            SpawnOptions::new()
                .cwd(dir.path())
                .env("SAFEXEC_TEST_VAR", "passed"),
        ),
    )?;

    let text = output.as_text().unwrap();
    let canonical = dir.path().canonicalize()?;
    assert!(text.starts_with(canonical.to_str().unwrap()), "{text}");
    assert!(text.ends_with("passed"));
    Ok(())
}

#[test]
fn test_configure_hook_runs_last() -> Result<()> {
    let output = runner().run(
        &Command::new("sh").args(["-c", "printf '%s' \"$HOOKED\""]),
        &RunOptions::new().quiet(true).spawn(
            SpawnOptions::new()
                .env("HOOKED", "from-options")
                .configure(|cmd| {
                    cmd.env("HOOKED", "from-hook");
                }),
        ),
    )?;
    assert_eq!(output.as_text(), Some("from-hook"));
    Ok(())
}

// ============================================================================
// Pipelines
// ============================================================================

#[test]
fn test_printf_grep_pipeline() -> Result<()> {
    let output = runner().run_pipeline(
        &[
            Command::new("printf").arg("a\nb\nc\n"),
            Command::new("grep").arg("b"),
        ],
        &PipelineOptions::default(),
    )?;
    assert_eq!(output.as_text(), Some("b\n"));
    Ok(())
}

#[test]
fn test_first_failure_wins_over_later_failures() {
    let err = runner()
        .run_pipeline(
            &[
                Command::new("true"),
                Command::new("sh").args(["-c", "cat >/dev/null; exit 7"]),
                Command::new("sh").args(["-c", "cat >/dev/null; exit 9"]),
            ],
            &PipelineOptions::new().quiet(true),
        )
        .unwrap_err();

    match err {
        RunnerError::ExecutionFailed { index, status, .. } => {
            assert_eq!(index, 1);
            assert_eq!(status, ProcessStatus::Exited { code: 7 });
        }
        other => panic!("Expected ExecutionFailed, got {other:?}"),
    }
}

#[test]
fn test_pipeline_with_early_exiting_consumer() -> Result<()> {
    // `yes` is killed by SIGPIPE once `head` exits, which is abnormal
    let err = runner()
        .run_pipeline(
            &[Command::new("yes"), Command::new("head").args(["-n", "3"])],
            &PipelineOptions::new().quiet(true),
        )
        .unwrap_err();

    assert!(matches!(err, RunnerError::ExecutionFailed { index: 0, .. }));
    Ok(())
}

#[test]
fn test_pipeline_stdin_and_stderr_files() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("in.txt");
    let errors = dir.path().join("err.txt");
    std::fs::write(&input, "3\n1\n2\n")?;

    let output = runner().run_pipeline(
        &[
            Command::new("sh").args(["-c", "sort; echo sorted >&2"]),
            Command::new("tail").args(["-n", "1"]),
        ],
        &PipelineOptions::new()
            .quiet(true)
            .stdin(StageInput::File(input))
            .stderr(StageErrors::File(errors.clone())),
    )?;

    assert_eq!(output.as_text(), Some("3\n"));
    assert_eq!(std::fs::read_to_string(errors)?, "sorted\n");
    Ok(())
}

#[test]
fn test_missing_stdin_file_is_io_error() {
    let err = runner()
        .run_pipeline(
            &[Command::new("cat")],
            &PipelineOptions::new()
                .quiet(true)
                .stdin(StageInput::File("/nonexistent/safexec/input".into())),
        )
        .unwrap_err();
    assert!(matches!(err, RunnerError::Io { .. }), "{err:?}");
}

#[test]
fn test_pipeline_spawn_failure_reaps_started_stages() {
    let err = runner()
        .run_pipeline(
            &[
                Command::new("sleep").arg("30"),
                Command::new("safexec_no_such_program_4242"),
            ],
            &PipelineOptions::new().quiet(true).stdin(StageInput::Null),
        )
        .unwrap_err();
    assert!(matches!(err, RunnerError::Spawn { .. }), "{err:?}");
}
