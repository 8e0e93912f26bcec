//! Process exit statuses and fail-fast evaluation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::process::ExitStatus;
use tracing::debug;

use crate::command::Command;
use crate::error::RunnerError;

/// How a child process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Terminated normally with an exit code
    Exited { code: i32 },
    /// Killed or stopped by a signal, or otherwise without an exit code
    Abnormal {
        signal: Option<i32>,
        core_dumped: bool,
        /// Raw wait status as reported by the operating system
        raw: i32,
    },
}

impl ProcessStatus {
    #[must_use]
    pub const fn terminated_normally(&self) -> bool {
        matches!(self, Self::Exited { .. })
    }

    /// Exit code, present iff the process terminated normally.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exited { code } => Some(*code),
            Self::Abnormal { .. } => None,
        }
    }

    /// Raw status, present iff the process terminated abnormally.
    #[must_use]
    pub const fn raw(&self) -> Option<i32> {
        match self {
            Self::Exited { .. } => None,
            Self::Abnormal { raw, .. } => Some(*raw),
        }
    }

    #[must_use]
    pub const fn signal(&self) -> Option<i32> {
        match self {
            Self::Exited { .. } => None,
            Self::Abnormal { signal, .. } => *signal,
        }
    }

    /// Normal termination with exit code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, Self::Exited { code: 0 })
    }
}

impl From<ExitStatus> for ProcessStatus {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited { code };
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            Self::Abnormal {
                signal: status.signal().or_else(|| status.stopped_signal()),
                core_dumped: status.core_dumped(),
                raw: status.into_raw(),
            }
        }

        #[cfg(not(unix))]
        {
            Self::Abnormal {
                signal: None,
                core_dumped: false,
                raw: -1,
            }
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited { code } => write!(f, "exit status {code}"),
            Self::Abnormal {
                signal: Some(signal),
                core_dumped,
                ..
            } => {
                write!(f, "terminated by signal {signal}")?;
                if *core_dumped {
                    write!(f, " (core dumped)")?;
                }
                Ok(())
            }
            Self::Abnormal {
                signal: None, raw, ..
            } => write!(f, "terminated abnormally (raw status {raw})"),
        }
    }
}

/// Position and value of the first status that is not a clean exit.
#[must_use]
pub fn first_failure(statuses: &[ProcessStatus]) -> Option<(usize, ProcessStatus)> {
    statuses
        .iter()
        .copied()
        .enumerate()
        .find(|(_, status)| !status.success())
}

/// Fail on the first bad status, otherwise hand `output` back unchanged.
///
/// Statuses are scanned strictly in list order and must be positionally
/// aligned with `commands`. Only the first bad status is reported; later ones
/// are never inspected. Unless `quiet`, a diagnostic distinguishing a nonzero
/// normal exit from abnormal termination is written to `out` first. Writing
/// the diagnostic is best-effort and never masks the failure.
///
/// ```rust
/// use safexec_runner::{Command, ProcessStatus, RunnerError, evaluate};
///
/// let commands = [Command::new("a"), Command::new("b")];
/// let statuses = [ProcessStatus::Exited { code: 0 }, ProcessStatus::Exited { code: 3 }];
/// let mut diagnostics = Vec::<u8>::new();
///
/// let err = evaluate("out", &commands, &statuses, false, &mut diagnostics).unwrap_err();
/// assert!(matches!(err, RunnerError::ExecutionFailed { index: 1, .. }));
/// ```
pub fn evaluate<T, W>(
    output: T,
    commands: &[Command],
    statuses: &[ProcessStatus],
    quiet: bool,
    out: &mut W,
) -> Result<T, RunnerError>
where
    W: Write + ?Sized,
{
    if commands.len() != statuses.len() {
        return Err(RunnerError::StatusMismatch {
            commands: commands.len(),
            statuses: statuses.len(),
        });
    }

    let Some((index, status)) = first_failure(statuses) else {
        return Ok(output);
    };
    let command = &commands[index];
    debug!(index, program = %command.program_name(), %status, "command failed");

    if !quiet {
        let _ = write_diagnostic(out, &status);
    }

    Err(RunnerError::ExecutionFailed {
        index,
        command: command.clone(),
        status,
    })
}

fn write_diagnostic<W: Write + ?Sized>(out: &mut W, status: &ProcessStatus) -> std::io::Result<()> {
    match status {
        ProcessStatus::Exited { code } => {
            writeln!(out, "Process Exited normally. Exit status:{code}")?;
        }
        ProcessStatus::Abnormal { raw, .. } => {
            writeln!(out, "Process exited abnormally:")?;
            writeln!(out, "ProcessStatus: {status}")?;
            writeln!(out, "Raw POSIX Status: {raw}")?;
        }
    }
    out.flush()
}
