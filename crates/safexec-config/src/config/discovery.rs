use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::model::{TomlConfig, TomlDefaults};
use super::{CONFIG_DIR, CONFIG_FILE, CliArgs, Config, ConfigSource, Defaults, SpawnConfig};

/// Directory entries that mark a repository root and end the upward search.
const REPO_MARKERS: [&str; 3] = [".git", ".hg", ".svn"];

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut source_attribution = HashMap::new();

        let mut defaults = Defaults::default();
        let mut spawn = SpawnConfig::default();

        for key in ["quiet", "binary", "verbose"] {
            source_attribution.insert(key.to_string(), ConfigSource::Defaults);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit_path) => Some(explicit_path.clone()),
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            debug!(path = %path.display(), "loading config file");
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;

            let config_source = ConfigSource::ConfigFile(path.clone());

            if let Some(file_defaults) = file_config.defaults {
                apply_file_defaults(
                    &mut defaults,
                    file_defaults,
                    &config_source,
                    &mut source_attribution,
                );
            }

            if let Some(file_spawn) = file_config.spawn {
                if let Some(cwd) = file_spawn.cwd {
                    spawn.cwd = Some(resolve_against_project(path, cwd));
                    source_attribution.insert("cwd".to_string(), config_source.clone());
                }
                if file_spawn.env_clear.is_some() {
                    spawn.env_clear = file_spawn.env_clear;
                    source_attribution.insert("env_clear".to_string(), config_source.clone());
                }
                if !file_spawn.env.is_empty() {
                    spawn.env = file_spawn.env;
                    source_attribution.insert("env".to_string(), config_source.clone());
                }
                if !file_spawn.env_remove.is_empty() {
                    spawn.env_remove = file_spawn.env_remove;
                    source_attribution.insert("env_remove".to_string(), config_source);
                }
            }
        }

        // Apply CLI overrides (highest priority)
        if let Some(quiet) = cli_args.quiet {
            defaults.quiet = Some(quiet);
            source_attribution.insert("quiet".to_string(), ConfigSource::Cli);
        }
        if let Some(binary) = cli_args.binary {
            defaults.binary = Some(binary);
            source_attribution.insert("binary".to_string(), ConfigSource::Cli);
        }
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }
        if let Some(cwd) = &cli_args.cwd {
            spawn.cwd = Some(cwd.clone());
            source_attribution.insert("cwd".to_string(), ConfigSource::Cli);
        }
        if let Some(env_clear) = cli_args.env_clear {
            spawn.env_clear = Some(env_clear);
            source_attribution.insert("env_clear".to_string(), ConfigSource::Cli);
        }
        if !cli_args.env.is_empty() {
            spawn.env.extend(cli_args.env.iter().cloned());
            source_attribution.insert("env".to_string(), ConfigSource::Cli);
        }
        if !cli_args.env_remove.is_empty() {
            spawn.env_remove.extend(cli_args.env_remove.iter().cloned());
            source_attribution.insert("env_remove".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            defaults,
            spawn,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.safexec/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir;

        loop {
            let config_path = current_dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.is_file() {
                return Ok(Some(config_path));
            }

            if REPO_MARKERS
                .iter()
                .any(|marker| current_dir.join(marker).exists())
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent,
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).with_context(|| {
                    format!("Failed to parse TOML config file: {}", path.display())
                })?;
                Ok(config)
            }
            // An explicit path that does not exist falls back to defaults
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}

fn apply_file_defaults(
    defaults: &mut Defaults,
    file_defaults: TomlDefaults,
    config_source: &ConfigSource,
    source_attribution: &mut HashMap<String, ConfigSource>,
) {
    let fields = [
        ("quiet", &mut defaults.quiet, file_defaults.quiet),
        ("binary", &mut defaults.binary, file_defaults.binary),
        ("verbose", &mut defaults.verbose, file_defaults.verbose),
    ];
    for (key, slot, value) in fields {
        if value.is_some() {
            *slot = value;
            source_attribution.insert(key.to_string(), config_source.clone());
        }
    }
}

/// Resolve a relative `cwd` against the directory holding `.safexec/`.
fn resolve_against_project(config_path: &Path, cwd: PathBuf) -> PathBuf {
    if cwd.is_absolute() {
        return cwd;
    }
    match config_path.parent().and_then(Path::parent) {
        Some(project_root) => project_root.join(cwd),
        None => cwd,
    }
}
