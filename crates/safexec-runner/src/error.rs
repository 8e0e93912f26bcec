//! Error types for command and pipeline execution

use serde::Serialize;
use std::io;
use thiserror::Error;

use crate::command::Command;
use crate::status::ProcessStatus;

/// Execution errors.
///
/// Every variant is fatal at this layer: nothing is retried and there is no
/// partial-success value. Conditions that are expected during normal
/// operation (end-of-stream on output, a child closing its stdin early) never
/// become errors.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The first command, in list order, that did not exit cleanly
    #[error("Command {command} failed at position {index}: {status}")]
    ExecutionFailed {
        index: usize,
        command: Command,
        status: ProcessStatus,
    },

    #[error("Failed to spawn process '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("Failed to wait for process '{program}': {source}")]
    Wait { program: String, source: io::Error },

    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        source: io::Error,
    },

    #[error("Pipeline must contain at least one command")]
    EmptyPipeline,

    #[error("Status list has {statuses} entries but command list has {commands}")]
    StatusMismatch { commands: usize, statuses: usize },
}

impl RunnerError {
    pub(crate) fn io(context: &'static str, source: io::Error) -> Self {
        Self::Io { context, source }
    }

    /// Stable machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Spawn { .. } => "spawn",
            Self::Wait { .. } => "wait",
            Self::Io { .. } => "io",
            Self::EmptyPipeline => "empty_pipeline",
            Self::StatusMismatch { .. } => "status_mismatch",
        }
    }

    /// The failed process status, for execution failures.
    #[must_use]
    pub const fn status(&self) -> Option<&ProcessStatus> {
        match self {
            Self::ExecutionFailed { status, .. } => Some(status),
            _ => None,
        }
    }

    /// Serializable summary for JSON error output.
    #[must_use]
    pub fn report(&self) -> FailureReport {
        let (index, command, status) = match self {
            Self::ExecutionFailed {
                index,
                command,
                status,
            } => (Some(*index), Some(command.argv_lossy()), Some(*status)),
            _ => (None, None, None),
        };

        FailureReport {
            kind: self.kind(),
            message: self.to_string(),
            index,
            command,
            status,
        }
    }
}

/// JSON shape of a [`RunnerError`].
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProcessStatus>,
}
