//! Command-line interface for safexec
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions and parsing structures (clap)
//! - `run`: Main entry point and command dispatch
//! - `commands`: Command implementations and helpers
//! - `tests`: Test module (cfg(test) only)

pub mod args;
mod commands;
mod run;

#[cfg(test)]
mod tests;

pub use args::{Cli, Commands, DEFAULT_SEPARATOR, OutputArgs, SpawnArgs, parse_env_pair};
pub use commands::{UsageError, describe_failure, split_stages};
pub use run::{build_cli_args, run, run_with};
