//! Configuration management for safexec
//!
//! This module provides hierarchical configuration with discovery and precedence:
//! CLI > file > defaults.

mod discovery;
mod model;
mod sources;
mod validation;

pub use model::{CliArgs, Config, Defaults, SpawnConfig};

use safexec_runner::{PipelineOptions, RunOptions, SpawnOptions};
use std::path::PathBuf;

/// Directory searched for during discovery.
pub const CONFIG_DIR: &str = ".safexec";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Source of a configuration value for attribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    ConfigFile(PathBuf),
    Defaults,
}

impl ConfigSource {
    /// Short stable label used in `safexec config` output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::ConfigFile(_) => "config",
            Self::Defaults => "default",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::ConfigFile(path) => write!(f, "config file ({})", path.display()),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

impl Config {
    #[must_use]
    pub fn quiet(&self) -> bool {
        self.defaults.quiet.unwrap_or(false)
    }

    #[must_use]
    pub fn binary(&self) -> bool {
        self.defaults.binary.unwrap_or(false)
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    /// Child process settings as runner [`SpawnOptions`].
    #[must_use]
    pub fn spawn_options(&self) -> SpawnOptions {
        let mut options = SpawnOptions::new()
            .env_clear(self.spawn.env_clear.unwrap_or(false))
            .envs(&self.spawn.env);
        for name in &self.spawn.env_remove {
            options = options.env_remove(name);
        }
        if let Some(cwd) = &self.spawn.cwd {
            options = options.cwd(cwd);
        }
        options
    }

    /// Options for a single-command run, without stdin data.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions::new()
            .quiet(self.quiet())
            .binary(self.binary())
            .spawn(self.spawn_options())
    }

    /// Options for a pipeline run with inherited stdin and stderr.
    #[must_use]
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::new()
            .quiet(self.quiet())
            .binary(self.binary())
            .spawn(self.spawn_options())
    }
}
