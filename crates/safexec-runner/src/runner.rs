use std::io::{self, ErrorKind, Write};
use std::process::{ChildStdin, Stdio};
use std::thread::{self, ScopedJoinHandle};
use tracing::debug;

use crate::command::Command;
use crate::error::RunnerError;
use crate::format::format_command_list;
use crate::options::{PipelineOptions, RunOptions};
use crate::output::Output;
use crate::status::{ProcessStatus, evaluate};
use crate::tee::{TeeSource, tee};

// ============================================================================
// Runner - fail-fast command execution with live output
// ============================================================================

/// Runs commands and pipelines, echoing their output to a destination.
///
/// The destination receives the `Running Command:` banner, the live output
/// of the child processes and the failure diagnostics. Tests substitute a
/// `Vec<u8>`; [`Runner::stdout`] targets the process's standard output.
///
/// # Threading
///
/// The public interface is synchronous. Each invocation drains output on one
/// scoped thread while the calling thread feeds stdin and waits for exit
/// statuses, so a child blocked on a full output pipe can never deadlock the
/// input side. The draining thread is always joined before returning.
///
/// There is no timeout: a child that never exits blocks the caller.
#[derive(Debug)]
pub struct Runner<W> {
    out: W,
}

impl Runner<io::Stdout> {
    /// Runner writing to the process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Runner<W> {
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Run a single command and return its combined stdout/stderr.
    ///
    /// The command is sanitized, then spawned with stdin piped and both
    /// stdout and stderr connected to one OS pipe. While that pipe is drained
    /// into the destination, the calling thread writes `stdin_data` (a child
    /// that exits or closes stdin before consuming it is not an error) and
    /// closes stdin. Any status other than a clean zero exit becomes
    /// [`RunnerError::ExecutionFailed`].
    ///
    /// # Errors
    ///
    /// * [`RunnerError::ExecutionFailed`] - nonzero or abnormal exit
    /// * [`RunnerError::Spawn`] - the program could not be started
    /// * [`RunnerError::Wait`] / [`RunnerError::Io`] - OS-level failures
    pub fn run(&mut self, command: &Command, options: &RunOptions) -> Result<Output, RunnerError> {
        if !options.quiet {
            self.announce("Running Command", std::slice::from_ref(command))?;
        }

        let command = command.clone().sanitize();
        let program = command.program_name();

        let (reader, writer) =
            io::pipe().map_err(|e| RunnerError::io("creating output pipe", e))?;
        let writer_for_stderr = writer
            .try_clone()
            .map_err(|e| RunnerError::io("creating output pipe", e))?;

        let mut std_cmd = command.to_std_command(&options.spawn);
        std_cmd
            .stdin(Stdio::piped())
            .stdout(writer)
            .stderr(writer_for_stderr);
        let spawned = std_cmd.spawn();
        // The command still owns the parent's write ends; they must close or
        // the drain never sees end-of-stream.
        drop(std_cmd);

        let mut child = spawned.map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;
        debug!(pid = child.id(), program = %program, "spawned command");

        let stdin = child.stdin.take();
        let quiet = options.quiet;
        let out = &mut self.out;

        let (captured, fed, waited) = thread::scope(|scope| {
            let drainer = scope.spawn(move || drain(reader, quiet, out));
            let fed = feed_stdin(stdin, options.stdin_data.as_deref());
            let captured = join_drain(drainer);
            let waited = child.wait();
            (captured, fed, waited)
        });

        let status = ProcessStatus::from(waited.map_err(|source| RunnerError::Wait {
            program: program.clone(),
            source,
        })?);
        debug!(program = %program, %status, "command finished");

        let captured = captured.map_err(|e| RunnerError::io("reading command output", e))?;
        let output = Output::from_captured(captured, options.binary);
        let output = evaluate(output, std::slice::from_ref(&command), &[status], quiet, &mut self.out)?;

        fed.map_err(|e| RunnerError::io("writing command input", e))?;
        Ok(output)
    }

    pub(crate) fn announce(&mut self, label: &str, commands: &[Command]) -> Result<(), RunnerError> {
        writeln!(self.out, "{label}:\n{}", format_command_list(commands))
            .and_then(|()| self.out.flush())
            .map_err(|e| RunnerError::io("writing command banner", e))
    }

    pub(crate) fn out_mut(&mut self) -> &mut W {
        &mut self.out
    }
}

/// Tee `source` into `out`, or only capture it when quiet.
pub(crate) fn drain<R, W>(mut source: R, quiet: bool, out: &mut W) -> io::Result<Vec<u8>>
where
    R: TeeSource,
    W: Write + ?Sized,
{
    if quiet {
        tee(&mut source, &mut io::sink())
    } else {
        tee(&mut source, out)
    }
}

/// Join the drain thread, re-raising its panic on the caller.
pub(crate) fn join_drain(handle: ScopedJoinHandle<'_, io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

/// Write `data` to the child's stdin, then close it.
///
/// A broken pipe means the child exited or closed its input first, which is
/// expected and swallowed. Other write errors are returned so the caller can
/// report them after status evaluation.
fn feed_stdin(stdin: Option<ChildStdin>, data: Option<&[u8]>) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };

    let result = match data {
        Some(data) => match stdin.write_all(data).and_then(|()| stdin.flush()) {
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                debug!(bytes = data.len(), "command closed stdin before consuming input");
                Ok(())
            }
            other => other,
        },
        None => Ok(()),
    };

    drop(stdin);
    result
}

/// Run a single command against standard output.
///
/// Convenience for [`Runner::run`] on [`Runner::stdout`].
pub fn run_command(command: &Command, options: &RunOptions) -> Result<Output, RunnerError> {
    Runner::stdout().run(command, options)
}

/// Run a pipeline against standard output.
///
/// Convenience for [`Runner::run_pipeline`] on [`Runner::stdout`].
pub fn run_pipeline(commands: &[Command], options: &PipelineOptions) -> Result<Output, RunnerError> {
    Runner::stdout().run_pipeline(commands, options)
}
