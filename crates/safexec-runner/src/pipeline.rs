use std::io::{self, Write};
use std::process::{Child, Stdio};
use std::thread;
use tracing::{debug, warn};

use crate::command::Command;
use crate::error::RunnerError;
use crate::options::{PipelineOptions, SpawnOptions};
use crate::output::Output;
use crate::runner::{Runner, drain, join_drain};
use crate::status::{ProcessStatus, evaluate};

impl<W: Write + Send> Runner<W> {
    /// Run a pipeline, each stage's stdout feeding the next stage's stdin.
    ///
    /// Only the final stage's stdout is captured and teed; stage stderr goes
    /// wherever [`PipelineOptions::stderr`] says. Statuses are collected for
    /// every stage in list order and the first bad one, by position, fails
    /// the whole pipeline.
    ///
    /// ```rust,no_run
    /// use safexec_runner::{Command, PipelineOptions, Runner};
    ///
    /// let output = Runner::stdout()
    ///     .run_pipeline(
    ///         &[
    ///             Command::new("printf").arg("a\nb\nc\n"),
    ///             Command::new("grep").arg("b"),
    ///         ],
    ///         &PipelineOptions::default(),
    ///     )
    ///     .unwrap();
    /// assert_eq!(output.as_text(), Some("b\n"));
    /// ```
    ///
    /// # Errors
    ///
    /// * [`RunnerError::EmptyPipeline`] - no commands were given
    /// * [`RunnerError::ExecutionFailed`] - the first stage that exited badly
    /// * [`RunnerError::Spawn`] - a stage could not be started; stages
    ///   already running are killed and reaped first
    pub fn run_pipeline(
        &mut self,
        commands: &[Command],
        options: &PipelineOptions,
    ) -> Result<Output, RunnerError> {
        if commands.is_empty() {
            return Err(RunnerError::EmptyPipeline);
        }
        if !options.quiet {
            self.announce("Running Pipeline", commands)?;
        }

        let commands: Vec<Command> = commands.iter().cloned().map(Command::sanitize).collect();
        let mut stages = spawn_stages(&commands, options)?;

        let Some(source) = stages.last_mut().and_then(|child| child.stdout.take()) else {
            reap(&mut stages);
            return Err(RunnerError::io(
                "capturing pipeline output",
                io::Error::other("final stage has no stdout"),
            ));
        };

        let quiet = options.quiet;
        let out = self.out_mut();
        let (captured, waited) = thread::scope(|scope| {
            let drainer = scope.spawn(move || drain(source, quiet, out));
            let captured = join_drain(drainer);
            let waited: Vec<io::Result<_>> = stages.iter_mut().map(Child::wait).collect();
            (captured, waited)
        });

        let mut statuses = Vec::with_capacity(waited.len());
        for (command, result) in commands.iter().zip(waited) {
            let status = ProcessStatus::from(result.map_err(|source| RunnerError::Wait {
                program: command.program_name(),
                source,
            })?);
            statuses.push(status);
        }
        debug!(?statuses, "pipeline finished");

        let captured = captured.map_err(|e| RunnerError::io("reading pipeline output", e))?;
        let output = Output::from_captured(captured, options.binary);
        evaluate(output, &commands, &statuses, quiet, self.out_mut())
    }
}

/// Spawn every stage, chaining stdout to stdin through OS pipes.
///
/// Each intermediate stdout is moved into the next stage's command and
/// dropped with it, so the parent never holds a copy of an inner pipe.
fn spawn_stages(commands: &[Command], options: &PipelineOptions) -> Result<Vec<Child>, RunnerError> {
    let errors = options
        .stderr
        .open()
        .map_err(|e| RunnerError::io("opening pipeline stderr", e))?;
    let mut stages: Vec<Child> = Vec::with_capacity(commands.len());

    for (index, command) in commands.iter().enumerate() {
        let stdin = match stages.last_mut() {
            Some(previous) => previous.stdout.take().map_or_else(Stdio::null, Stdio::from),
            None => match options.stdin.open() {
                Ok(stdin) => stdin,
                Err(e) => {
                    reap(&mut stages);
                    return Err(RunnerError::io("opening pipeline stdin", e));
                }
            },
        };
        let stderr = match errors.stdio() {
            Ok(stderr) => stderr,
            Err(e) => {
                reap(&mut stages);
                return Err(RunnerError::io("opening pipeline stderr", e));
            }
        };

        match spawn_stage(command, &options.spawn, stdin, stderr) {
            Ok(child) => {
                debug!(index, pid = child.id(), program = %command.program_name(), "spawned stage");
                stages.push(child);
            }
            Err(source) => {
                reap(&mut stages);
                return Err(RunnerError::Spawn {
                    program: command.program_name(),
                    source,
                });
            }
        }
    }

    Ok(stages)
}

fn spawn_stage(
    command: &Command,
    spawn: &SpawnOptions,
    stdin: Stdio,
    stderr: Stdio,
) -> io::Result<Child> {
    command
        .to_std_command(spawn)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(stderr)
        .spawn()
}

/// Tear down a partially built pipeline.
fn reap(stages: &mut [Child]) {
    for child in stages.iter_mut() {
        drop(child.stdout.take());
        if let Err(err) = child.kill() {
            warn!(pid = child.id(), %err, "failed to kill pipeline stage");
        }
        let _ = child.wait();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::options::{StageErrors, StageInput};

    fn runner() -> Runner<Vec<u8>> {
        Runner::new(Vec::new())
    }

    #[test]
    fn test_printf_grep() {
        let mut runner = runner();
        let output = runner
            .run_pipeline(
                &[
                    Command::new("printf").arg("a\nb\nc\n"),
                    Command::new("grep").arg("b"),
                ],
                &PipelineOptions::default(),
            )
            .unwrap();

        assert_eq!(output.as_text(), Some("b\n"));
        let transcript = String::from_utf8(runner.into_inner()).unwrap();
        assert_eq!(
            transcript,
            "Running Pipeline:\n\"printf\" \"a\nb\nc\n\" | \"grep\" \"b\"\nb\n"
        );
    }

    #[test]
    fn test_single_stage_pipeline() {
        let mut runner = runner();
        let output = runner
            .run_pipeline(
                &[Command::new("echo").arg("solo")],
                &PipelineOptions::new().quiet(true),
            )
            .unwrap();
        assert_eq!(output.as_text(), Some("solo\n"));
    }

    #[test]
    fn test_three_stages() {
        let mut runner = runner();
        let output = runner
            .run_pipeline(
                &[
                    Command::new("printf").arg("c\na\nb\n"),
                    Command::new("sort"),
                    Command::new("head").args(["-n", "2"]),
                ],
                &PipelineOptions::new().quiet(true),
            )
            .unwrap();
        assert_eq!(output.as_text(), Some("a\nb\n"));
    }

    #[test]
    fn test_empty_pipeline() {
        let err = runner()
            .run_pipeline(&[], &PipelineOptions::default())
            .unwrap_err();
        assert!(matches!(err, RunnerError::EmptyPipeline));
    }

    #[test]
    fn test_first_failing_stage_is_reported() {
        let mut runner = runner();
        let err = runner
            .run_pipeline(
                &[
                    Command::new("sh").args(["-c", "exit 3"]),
                    Command::new("cat"),
                    Command::new("false"),
                ],
                &PipelineOptions::new().quiet(true),
            )
            .unwrap_err();

        match err {
            RunnerError::ExecutionFailed { index, status, .. } => {
                assert_eq!(index, 0);
                assert_eq!(status, ProcessStatus::Exited { code: 3 });
            }
            other => panic!("Expected ExecutionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_last_stage_failure() {
        let mut runner = runner();
        let err = runner
            .run_pipeline(
                &[Command::new("printf").arg("a\n"), Command::new("grep").arg("zzz")],
                &PipelineOptions::default(),
            )
            .unwrap_err();

        assert!(matches!(err, RunnerError::ExecutionFailed { index: 1, .. }));
        let transcript = String::from_utf8(runner.into_inner()).unwrap();
        assert!(transcript.ends_with("Process Exited normally. Exit status:1\n"));
    }

    #[test]
    fn test_missing_stage_program() {
        let mut runner = runner();
        let err = runner
            .run_pipeline(
                &[
                    Command::new("printf").arg("x"),
                    Command::new("this_command_definitely_does_not_exist_12345"),
                ],
                &PipelineOptions::new().quiet(true),
            )
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[test]
    fn test_stage_input_from_file() {
        let dir = std::env::temp_dir().join(format!("safexec-pipeline-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("input.txt");
        std::fs::write(&input, "one\ntwo\nthree\n").unwrap();

        let mut runner = runner();
        let output = runner
            .run_pipeline(
                &[Command::new("cat"), Command::new("wc").arg("-l")],
                &PipelineOptions::new()
                    .quiet(true)
                    .stdin(StageInput::File(input))
                    .stderr(StageErrors::Null),
            )
            .unwrap();

        assert_eq!(output.as_text().map(str::trim), Some("3"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_stage_stderr_to_file_is_not_captured() {
        let dir = std::env::temp_dir().join(format!("safexec-stderr-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let log = dir.join("stderr.log");

        let mut runner = runner();
        let output = runner
            .run_pipeline(
                &[Command::new("sh").args(["-c", "echo visible; echo hidden >&2"])],
                &PipelineOptions::new()
                    .quiet(true)
                    .stdin(StageInput::Null)
                    .stderr(StageErrors::File(log.clone())),
            )
            .unwrap();

        assert_eq!(output.as_text(), Some("visible\n"));
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "hidden\n");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
