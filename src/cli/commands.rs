//! CLI command implementations
//!
//! This module contains the `execute_*` command handlers and their helpers.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{
    Command, Config, Output, ProcessStatus, Runner, RunnerError, StageErrors, StageInput,
    format_command_list,
};

/// Invalid command line that clap cannot detect, such as an empty stage.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct UsageError(pub String);

// ============================================================================
// Stage parsing
// ============================================================================

/// Split a flat argument list into commands on standalone `separator` elements.
///
/// The separator only counts as a whole argument, so `'a|b'` stays one
/// argument. Empty stages (leading, trailing or doubled separators) are
/// rejected.
pub fn split_stages(argv: &[OsString], separator: &str) -> Result<Vec<Command>, UsageError> {
    let mut commands = Vec::new();
    for (position, stage) in argv
        .split(|arg| arg.as_os_str() == separator)
        .enumerate()
    {
        let command = Command::from_argv(stage.iter().cloned()).ok_or_else(|| {
            UsageError(format!(
                "pipeline stage {position} is empty (check the '{separator}' separators)"
            ))
        })?;
        commands.push(command);
    }
    Ok(commands)
}

fn single_command(argv: &[OsString]) -> Result<Command, UsageError> {
    Command::from_argv(argv.iter().cloned())
        .ok_or_else(|| UsageError("no command given".to_string()))
}

// ============================================================================
// Run Command
// ============================================================================

/// Execute `safexec run`
pub fn execute_run_command(
    argv: &[OsString],
    stdin_file: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let command = single_command(argv)?;

    let mut options = config.run_options();
    if let Some(path) = stdin_file {
        options = options.stdin_data(read_stdin_source(path)?);
    }

    let output = Runner::stdout().run(&command, &options)?;
    if options.quiet {
        emit_captured(&output)?;
    }
    Ok(())
}

fn read_stdin_source(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut data = Vec::new();
        io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read stdin")?;
        return Ok(data);
    }
    std::fs::read(path).with_context(|| format!("Failed to read stdin file: {}", path.display()))
}

// ============================================================================
// Pipe Command
// ============================================================================

/// Execute `safexec pipe`
pub fn execute_pipe_command(
    argv: &[OsString],
    separator: &str,
    stdin_file: Option<PathBuf>,
    stderr_file: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let commands = split_stages(argv, separator)?;

    let mut options = config.pipeline_options();
    if let Some(path) = stdin_file {
        options = options.stdin(StageInput::File(path));
    }
    if let Some(path) = stderr_file {
        options = options.stderr(StageErrors::File(path));
    }

    let output = Runner::stdout().run_pipeline(&commands, &options)?;
    if options.quiet {
        emit_captured(&output)?;
    }
    Ok(())
}

/// Print captured output after a quiet run.
fn emit_captured(output: &Output) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .context("Failed to write captured output")
}

// ============================================================================
// Fmt Command
// ============================================================================

/// Execute `safexec fmt`
pub fn execute_fmt_command(argv: &[OsString], separator: &str) -> Result<()> {
    let commands = split_stages(argv, separator)?;
    let sanitized: Vec<Command> = commands.into_iter().map(Command::sanitize).collect();
    println!("{}", format_command_list(&sanitized));
    Ok(())
}

// ============================================================================
// Config Command
// ============================================================================

/// Execute `safexec config`
pub fn execute_config_command(config: &Config, json: bool) -> Result<()> {
    let effective = config.effective_config();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = effective
            .into_iter()
            .map(|(key, (value, source))| {
                (key, serde_json::json!({ "value": value, "source": source }))
            })
            .collect();
        let rendered = serde_json::to_string_pretty(&serde_json::Value::Object(map))
            .context("Failed to serialize configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Effective configuration:");
    for (key, (value, source)) in effective {
        println!("  {key} = {value}  ({source})");
    }
    Ok(())
}

// ============================================================================
// Failure reporting
// ============================================================================

/// Human-readable one-line description of a runner failure.
#[must_use]
pub fn describe_failure(error: &RunnerError) -> String {
    match error.status().and_then(ProcessStatus::signal).and_then(signal_name) {
        Some(name) => format!("{error} ({name})"),
        None => error.to_string(),
    }
}

#[cfg(unix)]
fn signal_name(signal: i32) -> Option<&'static str> {
    nix::sys::signal::Signal::try_from(signal)
        .ok()
        .map(nix::sys::signal::Signal::as_str)
}

#[cfg(not(unix))]
fn signal_name(_signal: i32) -> Option<&'static str> {
    None
}
