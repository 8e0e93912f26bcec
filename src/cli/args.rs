//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and all subcommand enums.

use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Stage separator used by `pipe` and `fmt` unless `--separator` is given.
pub const DEFAULT_SEPARATOR: &str = "|";

/// safexec - run programs without a shell, teeing their output
#[derive(Parser, Debug)]
#[command(name = "safexec")]
#[command(about = "Run commands and pipelines without a shell, streaming and capturing output")]
#[command(long_about = r#"
safexec executes programs directly, never through a shell, so arguments are
passed verbatim: metacharacters like ; | $ ` and quotes have no special meaning.
Output is shown live and captured; a nonzero or abnormal exit fails the run
with a diagnostic.

EXAMPLES:
  # Run a single command
  safexec run -- git status

  # Feed a file to the command's stdin
  safexec run --stdin-file input.txt -- sort

  # Run a pipeline; stages are separated by a standalone '|' argument
  safexec pipe -- printf 'a\nb\nc\n' '|' grep b

  # Show how a pipeline would be rendered without running it
  safexec fmt -- ls -l '|' wc -l

  # Print effective configuration with value sources
  safexec config

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .safexec/config.toml
  Use --config to specify an explicit config file path

EXIT STATUS:
  0 on success, the failed command's exit code, 128+N when it was killed by
  signal N, 127 when a program could not be started, 2 for usage errors.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print failures as a JSON report on stderr
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single command
    ///
    /// EXAMPLES:
    ///   safexec run -- echo hello
    ///   safexec run --quiet --binary -- cat image.png
    Run {
        #[command(flatten)]
        output: OutputArgs,

        /// File whose contents are written to the command's stdin ('-' for this process's stdin)
        #[arg(long, value_name = "PATH")]
        stdin_file: Option<PathBuf>,

        #[command(flatten)]
        spawn: SpawnArgs,

        /// Program and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
        argv: Vec<OsString>,
    },

    /// Run a pipeline of commands connected stdout to stdin
    ///
    /// EXAMPLES:
    ///   safexec pipe -- printf 'a\nb\n' '|' grep b
    ///   safexec pipe --separator ::: -- cat log ::: sort ::: uniq -c
    Pipe {
        #[command(flatten)]
        output: OutputArgs,

        /// Argument that separates pipeline stages
        #[arg(long, default_value = DEFAULT_SEPARATOR, value_name = "TOKEN")]
        separator: String,

        /// File connected to the first stage's stdin (default: inherited)
        #[arg(long, value_name = "PATH")]
        stdin_file: Option<PathBuf>,

        /// File receiving every stage's stderr (default: inherited)
        #[arg(long, value_name = "PATH")]
        stderr_file: Option<PathBuf>,

        #[command(flatten)]
        spawn: SpawnArgs,

        /// Stages, separated by the separator token
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "STAGES")]
        argv: Vec<OsString>,
    },

    /// Print the quoted rendering of a command or pipeline without running it
    Fmt {
        /// Argument that separates pipeline stages
        #[arg(long, default_value = DEFAULT_SEPARATOR, value_name = "TOKEN")]
        separator: String,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "STAGES")]
        argv: Vec<OsString>,
    },

    /// Print effective configuration and where each value came from
    Config,
}

/// Flags shared by `run` and `pipe` that shape output handling
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Suppress the announcement, live output and failure diagnostic;
    /// captured output is printed once the command succeeds
    #[arg(short, long)]
    pub quiet: bool,

    /// Treat captured output as raw bytes
    #[arg(long)]
    pub binary: bool,
}

/// Child process environment flags
#[derive(Args, Debug, Clone, Default)]
pub struct SpawnArgs {
    /// Working directory for the child process(es)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Set an environment variable (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Remove a variable from the inherited environment (repeatable)
    #[arg(long = "env-remove", value_name = "KEY")]
    pub env_remove: Vec<String>,

    /// Start children with an empty environment
    #[arg(long)]
    pub env_clear: bool,
}

/// Parse a `KEY=VALUE` argument.
pub fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(format!("missing variable name in '{raw}'")),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

impl Commands {
    /// Operation name used in error reports
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Run { .. } => "run",
            Self::Pipe { .. } => "pipe",
            Self::Fmt { .. } => "fmt",
            Self::Config => "config",
        }
    }
}
