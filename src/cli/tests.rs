//! CLI tests module
//!
//! Tests for argument parsing, stage splitting and configuration wiring.

use super::*;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

fn os(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

// ============================================================================
// Argument parsing
// ============================================================================

#[test]
fn test_run_parses_trailing_command() {
    let cli = Cli::try_parse_from(["safexec", "run", "--quiet", "--", "ls", "-l", "--color"]).unwrap();

    match cli.command {
        Commands::Run { output, argv, .. } => {
            assert!(output.quiet);
            assert_eq!(argv, os(&["ls", "-l", "--color"]));
        }
        other => panic!("Expected Run, got {other:?}"),
    }
}

#[test]
fn test_run_requires_command() {
    assert!(Cli::try_parse_from(["safexec", "run"]).is_err());
}

#[test]
fn test_pipe_default_separator() {
    let cli = Cli::try_parse_from(["safexec", "pipe", "--", "printf", "x", "|", "cat"]).unwrap();

    match cli.command {
        Commands::Pipe { separator, .. } => assert_eq!(separator, DEFAULT_SEPARATOR),
        other => panic!("Expected Pipe, got {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["safexec", "config", "--json", "--verbose"]).unwrap();
    assert!(cli.json);
    assert!(cli.verbose);
}

#[test]
fn test_env_flag_parsing() {
    let cli = Cli::try_parse_from([
        "safexec", "run", "--env", "A=1", "--env", "B=x=y", "--", "env",
    ])
    .unwrap();

    match cli.command {
        Commands::Run { spawn, .. } => assert_eq!(
            spawn.env,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "x=y".to_string())
            ]
        ),
        other => panic!("Expected Run, got {other:?}"),
    }
}

#[test]
fn test_parse_env_pair_rejects_malformed() {
    assert!(parse_env_pair("NOEQUALS").is_err());
    assert!(parse_env_pair("=value").is_err());
    assert_eq!(
        parse_env_pair("EMPTY=").unwrap(),
        ("EMPTY".to_string(), String::new())
    );
}

// ============================================================================
// Stage splitting
// ============================================================================

#[test]
fn test_split_stages() {
    let commands = split_stages(&os(&["printf", "a\nb\n", "|", "grep", "b"]), "|").unwrap();

    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].argv_lossy(), vec!["printf", "a\nb\n"]);
    assert_eq!(commands[1].argv_lossy(), vec!["grep", "b"]);
}

#[test]
fn test_split_stages_ignores_embedded_separator() {
    let commands = split_stages(&os(&["echo", "a|b", "||"]), "|").unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].args, os(&["a|b", "||"]));
}

#[test]
fn test_split_stages_custom_separator() {
    let commands = split_stages(&os(&["cat", "|", ":::", "wc"]), ":::").unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].args, os(&["|"]));
}

#[test]
fn test_split_stages_rejects_empty_stage() {
    for argv in [
        os(&["|", "cat"]),
        os(&["cat", "|"]),
        os(&["cat", "|", "|", "wc"]),
    ] {
        let err = split_stages(&argv, "|").unwrap_err();
        assert!(err.to_string().contains("is empty"), "{err}");
    }
}

// ============================================================================
// Config wiring
// ============================================================================

#[test]
fn test_absent_flags_do_not_override_config() {
    let cli = Cli::try_parse_from(["safexec", "run", "--", "true"]).unwrap();
    let args = build_cli_args(&cli);

    assert_eq!(args.quiet, None);
    assert_eq!(args.binary, None);
    assert_eq!(args.verbose, None);
    assert_eq!(args.env_clear, None);
}

#[test]
fn test_present_flags_override_config() {
    let cli = Cli::try_parse_from([
        "safexec",
        "--config",
        "/etc/safexec.toml",
        "pipe",
        "--binary",
        "--cwd",
        "/tmp",
        "--env-remove",
        "HOME",
        "--",
        "cat",
    ])
    .unwrap();
    let args = build_cli_args(&cli);

    assert_eq!(args.config_path, Some(PathBuf::from("/etc/safexec.toml")));
    assert_eq!(args.binary, Some(true));
    assert_eq!(args.cwd, Some(PathBuf::from("/tmp")));
    assert_eq!(args.env_remove, vec!["HOME".to_string()]);
}

#[test]
fn test_describe_failure_plain_exit() {
    let err = crate::RunnerError::ExecutionFailed {
        index: 0,
        command: crate::Command::new("false"),
        status: crate::ProcessStatus::Exited { code: 1 },
    };
    assert_eq!(describe_failure(&err), err.to_string());
}

#[cfg(unix)]
#[test]
fn test_describe_failure_names_signal() {
    let err = crate::RunnerError::ExecutionFailed {
        index: 0,
        command: crate::Command::new("sleep"),
        status: crate::ProcessStatus::Abnormal {
            signal: Some(9),
            core_dumped: false,
            raw: 9,
        },
    };
    assert!(describe_failure(&err).ends_with("(SIGKILL)"));
}
