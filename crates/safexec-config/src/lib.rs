//! Configuration management for safexec
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. Configuration files are TOML with `[defaults]`
//! and `[spawn]` sections.

mod config;

pub use config::{
    CONFIG_DIR, CONFIG_FILE, CliArgs, Config, ConfigSource, Defaults, SpawnConfig,
};
