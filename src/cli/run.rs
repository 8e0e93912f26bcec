//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Installs the tracing subscriber
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands, OutputArgs, SpawnArgs};
use super::commands::{self, UsageError};

use crate::logging::init_tracing;
use crate::{CliArgs, Config, ExitCode, RunnerError};

/// Main CLI execution function.
///
/// This function handles ALL output including errors. It returns `Result<(), ExitCode>`:
/// - On success: returns `Ok(())` after printing any output
/// - On error: prints the failure (text or JSON), returns `Err(ExitCode)`
///
/// main.rs only calls `std::process::exit(code.as_i32())` on error - it does NOT print.
pub fn run() -> Result<(), ExitCode> {
    run_with(Cli::parse())
}

/// Dispatch an already-parsed command line.
pub fn run_with(cli: Cli) -> Result<(), ExitCode> {
    let cli_args = build_cli_args(&cli);

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("safexec: configuration error: {err:#}");
            return Err(ExitCode::CLI_ARGS);
        }
    };

    if let Err(err) = init_tracing(config.verbose()) {
        eprintln!("safexec: failed to initialize logging: {err}");
    }

    let operation = cli.command.name();
    tracing::debug!(operation, "dispatching command");

    let result = match cli.command {
        Commands::Run {
            argv, stdin_file, ..
        } => commands::execute_run_command(&argv, stdin_file.as_deref(), &config),
        Commands::Pipe {
            argv,
            separator,
            stdin_file,
            stderr_file,
            ..
        } => commands::execute_pipe_command(&argv, &separator, stdin_file, stderr_file, &config),
        Commands::Fmt { argv, separator } => commands::execute_fmt_command(&argv, &separator),
        Commands::Config => commands::execute_config_command(&config, cli.json),
    };

    result.map_err(|err| report_failure(&err, operation, cli.json))
}

/// Merge the subcommand's flags into configuration overrides.
///
/// Boolean flags only override when present, so an absent `--quiet` leaves
/// the config file value in effect.
pub fn build_cli_args(cli: &Cli) -> CliArgs {
    let (output, spawn) = match &cli.command {
        Commands::Run { output, spawn, .. } | Commands::Pipe { output, spawn, .. } => {
            (output.clone(), spawn.clone())
        }
        Commands::Fmt { .. } | Commands::Config => (OutputArgs::default(), SpawnArgs::default()),
    };

    CliArgs {
        config_path: cli.config.clone(),
        quiet: output.quiet.then_some(true),
        binary: output.binary.then_some(true),
        verbose: cli.verbose.then_some(true),
        cwd: spawn.cwd,
        env_clear: spawn.env_clear.then_some(true),
        env: spawn.env,
        env_remove: spawn.env_remove,
    }
}

/// Print a failure on stderr and choose the exit code.
fn report_failure(err: &anyhow::Error, operation: &str, json: bool) -> ExitCode {
    if let Some(runner_err) = err.downcast_ref::<RunnerError>() {
        tracing::debug!(operation, kind = runner_err.kind(), "command failed");
        if json {
            match serde_json::to_string(&runner_err.report()) {
                Ok(rendered) => eprintln!("{rendered}"),
                Err(_) => eprintln!("safexec {operation}: {runner_err}"),
            }
        } else {
            eprintln!("safexec {operation}: {}", commands::describe_failure(runner_err));
        }
        return ExitCode::from(runner_err);
    }

    let code = if err.downcast_ref::<UsageError>().is_some() {
        ExitCode::CLI_ARGS
    } else {
        ExitCode::INTERNAL
    };

    if json {
        let report = serde_json::json!({
            "kind": if code == ExitCode::CLI_ARGS { "usage" } else { "internal" },
            "message": format!("{err:#}"),
        });
        eprintln!("{report}");
    } else {
        eprintln!("safexec {operation}: {err:#}");
    }
    code
}
