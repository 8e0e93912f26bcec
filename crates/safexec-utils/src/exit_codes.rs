//! Exit code constants and error mapping for safexec.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Command or pipeline completed cleanly |
//! | 1 | `INTERNAL` | General/internal failure, or a failure with no usable code |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 127 | `SPAWN_FAILURE` | A program could not be started |
//! | N | - | A command exited normally with nonzero code N |
//! | 128+S | - | A command was terminated by signal S |

use safexec_runner::{ProcessStatus, RunnerError};

/// Offset added to a signal number, as shells report signalled children.
const SIGNAL_BASE: i32 = 128;

/// Process exit code for the `safexec` binary and fail-fast callers.
///
/// ```rust
/// use safexec_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(2), ExitCode::CLI_ARGS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - command or pipeline completed cleanly
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Spawn failure - the program could not be started
    pub const SPAWN_FAILURE: ExitCode = ExitCode(127);

    /// Get the numeric exit code value.
    ///
    /// Use this with `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }

    /// Exit code that mirrors a failed child's status.
    #[must_use]
    pub const fn from_status(status: &ProcessStatus) -> Self {
        match status {
            ProcessStatus::Exited { code } if *code != 0 => ExitCode(*code),
            ProcessStatus::Abnormal {
                signal: Some(signal),
                ..
            } => ExitCode(SIGNAL_BASE + *signal),
            _ => ExitCode::INTERNAL,
        }
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl From<&RunnerError> for ExitCode {
    fn from(error: &RunnerError) -> Self {
        match error {
            RunnerError::ExecutionFailed { status, .. } => ExitCode::from_status(status),
            RunnerError::Spawn { .. } => ExitCode::SPAWN_FAILURE,
            RunnerError::EmptyPipeline => ExitCode::CLI_ARGS,
            RunnerError::Wait { .. } | RunnerError::Io { .. } | RunnerError::StatusMismatch { .. } => {
                ExitCode::INTERNAL
            }
        }
    }
}

/// Fail-fast unwrapping for callers that do not handle [`RunnerError`].
///
/// Library functions return errors; this trait is the opt-in way to keep the
/// "terminate the run on failure" behaviour at a call site.
///
/// ```rust,no_run
/// use safexec_runner::{Command, RunOptions, run_command};
/// use safexec_utils::exit_codes::OrExit;
///
/// let output = run_command(&Command::new("git").arg("status"), &RunOptions::default()).or_exit();
/// println!("{} bytes", output.len());
/// ```
pub trait OrExit<T> {
    /// Return the value, or report the error on stderr and exit the process.
    fn or_exit(self) -> T;
}

impl<T> OrExit<T> for Result<T, RunnerError> {
    fn or_exit(self) -> T {
        match self {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(kind = error.kind(), "{error}");
                eprintln!("safexec: {error}");
                std::process::exit(ExitCode::from(&error).as_i32())
            }
        }
    }
}
