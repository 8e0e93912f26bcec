//! Shell-safe process execution with live output capture
//!
//! Runs one external command, or a pipeline of commands connected
//! output-to-input, and turns any abnormal or nonzero exit into a
//! [`RunnerError::ExecutionFailed`] carrying the offending command and status.
//!
//! # Security Model
//!
//! All process execution goes through [`Command`], which is sanitized into an
//! explicit `(exec path, argv0)` pair before spawning. Arguments are passed as
//! discrete `OsString` elements and no code path builds `sh -c` or `cmd /C`.
//!
//! # Output
//!
//! Combined output is copied to the runner's destination as it is produced
//! (see [`tee`]) and also returned to the caller as an [`Output`].
//!
//! ```rust,no_run
//! use safexec_runner::{Command, RunOptions, Runner};
//!
//! let mut runner = Runner::stdout();
//! let output = runner
//!     .run(&Command::new("echo").arg("hello"), &RunOptions::default())
//!     .unwrap();
//! assert_eq!(output.as_text(), Some("hello\n"));
//! ```

pub mod command;
pub mod error;
pub mod format;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod runner;
pub mod status;
pub mod tee;

pub use command::{Command, Program, sanitize};
pub use error::{FailureReport, RunnerError};
pub use format::{format_command, format_command_list};
pub use options::{Configure, PipelineOptions, RunOptions, SpawnOptions, StageErrors, StageInput};
pub use output::Output;
pub use runner::{Runner, run_command, run_pipeline};
pub use status::{ProcessStatus, evaluate, first_failure};
pub use tee::{CHUNK_SIZE, TeeSource, tee};
