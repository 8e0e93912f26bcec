//! safexec - shell-safe process execution with live output tee
//!
//! safexec runs external programs without ever handing their arguments to a
//! shell. Output is streamed to a destination as it arrives and also captured
//! for the caller; pipelines are connected with OS pipes; any abnormal or
//! nonzero status fails the run.
//!
//! safexec can be used in two ways:
//! - **CLI**: `safexec run -- git status`, `safexec pipe -- printf 'a\nb\n' '|' grep b`
//! - **Library**: embed the runner directly
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use safexec::{Command, RunOptions, run_command};
//!
//! let output = run_command(&Command::new("echo").arg("hello"), &RunOptions::default())?;
//! assert_eq!(output.as_text(), Some("hello\n"));
//! # Ok::<(), safexec::RunnerError>(())
//! ```
//!
//! # Stable Public API
//!
//! - [`Command`], [`Program`], [`sanitize`] - argv model and sanitization
//! - [`Runner`], [`run_command`], [`run_pipeline`] - execution
//! - [`RunOptions`], [`PipelineOptions`], [`SpawnOptions`] - execution options
//! - [`ProcessStatus`], [`Output`] - results
//! - [`RunnerError`] - library error type
//! - [`Config`] and [`CliArgs`] - configuration discovery
//! - [`ExitCode`] and [`OrExit`] - exit-code mapping and fail-fast termination

// ============================================================================
// Stable Public API - covered by semver guarantees for 1.x
// ============================================================================

pub use safexec_runner::{
    CHUNK_SIZE, Command, Configure, FailureReport, Output, PipelineOptions, ProcessStatus,
    Program, RunOptions, Runner, RunnerError, SpawnOptions, StageErrors, StageInput, TeeSource,
    evaluate, first_failure, format_command, format_command_list, run_command, run_pipeline,
    sanitize, tee,
};

/// Configuration for safexec operations.
///
/// Precedence: CLI arguments > `.safexec/config.toml` > built-in defaults.
pub use safexec_config::{CliArgs, Config, ConfigSource};

/// Exit codes matching the documented exit code table.
///
/// Library code returns [`RunnerError`] and does NOT call `std::process::exit()`;
/// [`OrExit`] is the explicit opt-in for callers that want to.
pub use safexec_utils::exit_codes::{ExitCode, OrExit};

// ============================================================================
// Internal modules - accessible but not stable
// ============================================================================

#[doc(hidden)]
pub mod cli;

#[doc(hidden)]
pub use safexec_utils::logging;
