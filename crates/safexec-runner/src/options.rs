//! Options for command and pipeline execution

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::{Command as StdCommand, Stdio};
use std::sync::Arc;

/// Hook applied verbatim to every `std::process::Command` before spawning.
///
/// This is the passthrough for spawn settings this crate does not model
/// (process groups, uid/gid, platform flags). It runs after the recognized
/// options have been applied.
pub type Configure = Arc<dyn Fn(&mut StdCommand) + Send + Sync>;

// ============================================================================
// SpawnOptions
// ============================================================================

/// Settings forwarded to the spawn primitive.
///
/// None of these values are inspected or validated here; a bad working
/// directory surfaces as a spawn error from the operating system.
#[derive(Clone, Default)]
pub struct SpawnOptions {
    /// Working directory for the child
    pub cwd: Option<PathBuf>,
    /// Environment overrides
    pub env: HashMap<OsString, OsString>,
    /// Variables removed from the inherited environment
    pub env_remove: Vec<OsString>,
    /// Start from an empty environment
    pub env_clear: bool,
    /// Opaque passthrough hook
    pub configure: Option<Configure>,
}

impl SpawnOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.env
            .extend(envs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn env_remove(mut self, key: impl Into<OsString>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    #[must_use]
    pub fn env_clear(mut self, clear: bool) -> Self {
        self.env_clear = clear;
        self
    }

    /// Install the passthrough hook.
    ///
    /// ```rust
    /// use safexec_runner::SpawnOptions;
    ///
    /// let opts = SpawnOptions::new().configure(|cmd| {
    ///     cmd.env("FROM_HOOK", "1");
    /// });
    /// assert!(opts.configure.is_some());
    /// ```
    #[must_use]
    pub fn configure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StdCommand) + Send + Sync + 'static,
    {
        self.configure = Some(Arc::new(hook));
        self
    }

    pub(crate) fn apply(&self, cmd: &mut StdCommand) {
        if self.env_clear {
            cmd.env_clear();
        }
        for key in &self.env_remove {
            cmd.env_remove(key);
        }
        cmd.envs(&self.env);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        if let Some(hook) = &self.configure {
            hook(cmd);
        }
    }
}

impl fmt::Debug for SpawnOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnOptions")
            .field("cwd", &self.cwd)
            .field("env", &self.env)
            .field("env_remove", &self.env_remove)
            .field("env_clear", &self.env_clear)
            .field("configure", &self.configure.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

// ============================================================================
// RunOptions
// ============================================================================

/// Options for [`Runner::run`](crate::Runner::run).
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Bytes written to the child's stdin before it is closed
    pub stdin_data: Option<Vec<u8>>,
    /// Return [`Output::Binary`](crate::Output::Binary) instead of decoded text
    pub binary: bool,
    /// Suppress the command banner, live output and failure diagnostics
    pub quiet: bool,
    pub spawn: SpawnOptions,
}

impl RunOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stdin_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin_data = Some(data.into());
        self
    }

    #[must_use]
    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    #[must_use]
    pub fn spawn(mut self, spawn: SpawnOptions) -> Self {
        self.spawn = spawn;
        self
    }
}

// ============================================================================
// PipelineOptions
// ============================================================================

/// Where the first pipeline stage reads its input from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StageInput {
    /// The caller's own stdin
    #[default]
    Inherit,
    /// An empty stream
    Null,
    /// The contents of a file
    File(PathBuf),
}

impl StageInput {
    pub(crate) fn open(&self) -> io::Result<Stdio> {
        match self {
            Self::Inherit => Ok(Stdio::inherit()),
            Self::Null => Ok(Stdio::null()),
            Self::File(path) => File::open(path).map(Stdio::from),
        }
    }
}

/// Where every pipeline stage writes its stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StageErrors {
    /// The caller's own stderr
    #[default]
    Inherit,
    /// Discarded
    Null,
    /// Truncated and shared by all stages
    File(PathBuf),
}

/// An opened [`StageErrors`], cloned once per stage.
pub(crate) enum ErrorSink {
    Inherit,
    Null,
    File(File),
}

impl StageErrors {
    pub(crate) fn open(&self) -> io::Result<ErrorSink> {
        match self {
            Self::Inherit => Ok(ErrorSink::Inherit),
            Self::Null => Ok(ErrorSink::Null),
            Self::File(path) => File::create(path).map(ErrorSink::File),
        }
    }
}

impl ErrorSink {
    pub(crate) fn stdio(&self) -> io::Result<Stdio> {
        match self {
            Self::Inherit => Ok(Stdio::inherit()),
            Self::Null => Ok(Stdio::null()),
            Self::File(file) => file.try_clone().map(Stdio::from),
        }
    }
}

/// Options for [`Runner::run_pipeline`](crate::Runner::run_pipeline).
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Suppress the pipeline banner, live output and failure diagnostics
    pub quiet: bool,
    /// Return [`Output::Binary`](crate::Output::Binary) instead of decoded text
    pub binary: bool,
    /// Input of the first stage
    pub stdin: StageInput,
    /// Stderr of every stage
    pub stderr: StageErrors,
    /// Shared by all stages
    pub spawn: SpawnOptions,
}

impl PipelineOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    #[must_use]
    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    #[must_use]
    pub fn stdin(mut self, stdin: StageInput) -> Self {
        self.stdin = stdin;
        self
    }

    #[must_use]
    pub fn stderr(mut self, stderr: StageErrors) -> Self {
        self.stderr = stderr;
        self
    }

    #[must_use]
    pub fn spawn(mut self, spawn: SpawnOptions) -> Self {
        self.spawn = spawn;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_options_builder() {
        let opts = SpawnOptions::new()
            .cwd("/tmp")
            .env("A", "1")
            .envs([("B", "2")])
            .env_remove("C")
            .env_clear(true);

        assert_eq!(opts.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(opts.env.len(), 2);
        assert_eq!(opts.env.get(&OsString::from("B")), Some(&OsString::from("2")));
        assert_eq!(opts.env_remove, vec![OsString::from("C")]);
        assert!(opts.env_clear);
    }

    #[test]
    fn test_apply_sets_cwd_and_env() {
        let opts = SpawnOptions::new().cwd("/tmp").env("KEY", "value");
        let mut cmd = StdCommand::new("true");
        opts.apply(&mut cmd);

        assert_eq!(cmd.get_current_dir(), Some(std::path::Path::new("/tmp")));
        let envs: Vec<_> = cmd.get_envs().collect();
        assert!(envs.contains(&(
            std::ffi::OsStr::new("KEY"),
            Some(std::ffi::OsStr::new("value"))
        )));
    }

    #[test]
    fn test_apply_runs_hook_last() {
        let opts = SpawnOptions::new()
            .env("KEY", "from-options")
            .configure(|cmd| {
                cmd.env("KEY", "from-hook");
            });
        let mut cmd = StdCommand::new("true");
        opts.apply(&mut cmd);

        let value = cmd
            .get_envs()
            .find(|(k, _)| *k == "KEY")
            .and_then(|(_, v)| v);
        assert_eq!(value, Some(std::ffi::OsStr::new("from-hook")));
    }

    #[test]
    fn test_debug_hides_hook() {
        let opts = SpawnOptions::new().configure(|_| {});
        let rendered = format!("{opts:?}");
        assert!(rendered.contains("<hook>"));
    }

    #[test]
    fn test_run_options_builder() {
        let opts = RunOptions::new().stdin_data("abc").binary(true).quiet(true);
        assert_eq!(opts.stdin_data.as_deref(), Some(&b"abc"[..]));
        assert!(opts.binary);
        assert!(opts.quiet);
    }

    #[test]
    fn test_pipeline_options_defaults() {
        let opts = PipelineOptions::default();
        assert!(!opts.quiet);
        assert_eq!(opts.stdin, StageInput::Inherit);
        assert_eq!(opts.stderr, StageErrors::Inherit);
    }

    #[test]
    fn test_stage_input_missing_file_errors() {
        let input = StageInput::File(PathBuf::from("/definitely/not/here/input.txt"));
        assert!(input.open().is_err());
    }
}
