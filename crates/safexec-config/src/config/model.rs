use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use super::ConfigSource;

/// Effective configuration for safexec operations.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behavior that searches for
/// `.safexec/config.toml` upward from the current directory, stopping at a
/// repository root.
///
/// # Example
///
/// ```rust,no_run
/// use safexec_config::{CliArgs, Config};
///
/// let config = Config::discover(&CliArgs::default())?;
/// println!("quiet: {}", config.quiet());
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// quiet = false
/// binary = false
/// verbose = false
///
/// [spawn]
/// cwd = "build"
/// env_clear = false
/// env = { LC_ALL = "C" }
/// env_remove = ["GIT_DIR"]
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Runner behaviour defaults.
    pub defaults: Defaults,
    /// Child process environment and working directory.
    pub spawn: SpawnConfig,
    /// Source attribution for each setting (for `safexec config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[defaults]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Suppress the command announcement, the output tee and failure diagnostics.
    pub quiet: Option<bool>,
    /// Return captured output as raw bytes instead of lossy UTF-8 text.
    pub binary: Option<bool>,
    pub verbose: Option<bool>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            quiet: Some(false),
            binary: Some(false),
            verbose: Some(false),
        }
    }
}

/// `[spawn]` section
///
/// A relative `cwd` read from a config file is resolved against the directory
/// that contains `.safexec/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpawnConfig {
    pub cwd: Option<PathBuf>,
    pub env_clear: Option<bool>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub env_remove: Vec<String>,
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlConfig {
    pub(crate) defaults: Option<TomlDefaults>,
    pub(crate) spawn: Option<SpawnConfig>,
}

/// `[defaults]` as written on disk; every key is optional.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlDefaults {
    pub(crate) quiet: Option<bool>,
    pub(crate) binary: Option<bool>,
    pub(crate) verbose: Option<bool>,
}

/// Command-line overrides, the highest-precedence layer.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file; disables discovery.
    pub config_path: Option<PathBuf>,
    pub quiet: Option<bool>,
    pub binary: Option<bool>,
    pub verbose: Option<bool>,
    pub cwd: Option<PathBuf>,
    pub env_clear: Option<bool>,
    /// `KEY=VALUE` pairs, applied after (and overriding) file entries.
    pub env: Vec<(String, String)>,
    pub env_remove: Vec<String>,
}
