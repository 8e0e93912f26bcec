use std::ffi::{OsStr, OsString};
use std::fmt;
use std::process::Command as StdCommand;

use crate::format::format_command;
use crate::options::SpawnOptions;

// ============================================================================
// Program - element 0 of an argv
// ============================================================================

/// The executable slot of a [`Command`].
///
/// A bare name is what callers usually write. The pair form names the file to
/// execute and the `argv[0]` the process will see, which is the form the
/// spawn primitive executes directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Program {
    /// A bare executable name or path, not yet sanitized
    Bare(OsString),
    /// Pre-split executable path and argv0 display name
    Pair { path: OsString, argv0: OsString },
}

impl Program {
    /// The file that will be executed.
    #[must_use]
    pub fn path(&self) -> &OsStr {
        match self {
            Self::Bare(name) => name,
            Self::Pair { path, .. } => path,
        }
    }

    /// The name the process will see as `argv[0]`.
    #[must_use]
    pub fn argv0(&self) -> &OsStr {
        match self {
            Self::Bare(name) => name,
            Self::Pair { argv0, .. } => argv0,
        }
    }

    #[must_use]
    pub const fn is_pair(&self) -> bool {
        matches!(self, Self::Pair { .. })
    }
}

// ============================================================================
// Command - argv-style command description
// ============================================================================

/// An argv-style command: one executable followed by discrete arguments.
///
/// Arguments are `OsString` elements, never shell strings, so metacharacters
/// such as `;`, `|` or `$(...)` reach the child untouched.
///
/// # Example
///
/// ```rust
/// use safexec_runner::Command;
/// use std::ffi::OsString;
///
/// let cmd = Command::new("grep").arg("-n").arg("needle; rm -rf /");
///
/// assert_eq!(cmd.program.path(), "grep");
/// assert_eq!(cmd.args[1], OsString::from("needle; rm -rf /"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Element 0: the executable
    pub program: Program,
    /// Arguments as discrete elements (NOT shell strings)
    pub args: Vec<OsString>,
}

impl Command {
    /// Create a command from a bare executable name or path.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: Program::Bare(program.into()),
            args: Vec::new(),
        }
    }

    /// Create a command whose executable path and `argv[0]` differ.
    ///
    /// ```rust
    /// use safexec_runner::Command;
    ///
    /// let cmd = Command::with_arg0("/bin/busybox", "ls");
    /// assert_eq!(cmd.program.path(), "/bin/busybox");
    /// assert_eq!(cmd.program.argv0(), "ls");
    /// ```
    #[must_use]
    pub fn with_arg0(path: impl Into<OsString>, argv0: impl Into<OsString>) -> Self {
        Self {
            program: Program::Pair {
                path: path.into(),
                argv0: argv0.into(),
            },
            args: Vec::new(),
        }
    }

    /// Build a command from a full argv. Returns `None` for an empty argv.
    ///
    /// ```rust
    /// use safexec_runner::Command;
    ///
    /// let cmd = Command::from_argv(["printf", "%s\n", "a"]).unwrap();
    /// assert_eq!(cmd.args.len(), 2);
    /// assert!(Command::from_argv(Vec::<String>::new()).is_none());
    /// ```
    pub fn from_argv<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self::new(program).args(argv))
    }

    /// Add a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Rewrite element 0 into the `(exec path, argv0)` pair form.
    ///
    /// A bare program becomes a pair holding the same string in both slots,
    /// which tells the spawn primitive to execute that binary directly. An
    /// existing pair is left alone, so this is idempotent. Arguments are never
    /// touched.
    ///
    /// ```rust
    /// use safexec_runner::{Command, Program};
    ///
    /// let cmd = Command::new("ls").arg("-la").sanitize();
    /// assert_eq!(
    ///     cmd.program,
    ///     Program::Pair { path: "ls".into(), argv0: "ls".into() }
    /// );
    /// assert_eq!(cmd.clone().sanitize(), cmd);
    /// ```
    #[must_use]
    pub fn sanitize(mut self) -> Self {
        if let Program::Bare(name) = self.program {
            self.program = Program::Pair {
                path: name.clone(),
                argv0: name,
            };
        }
        self
    }

    /// Whether element 0 is already in pair form.
    #[must_use]
    pub const fn is_sanitized(&self) -> bool {
        self.program.is_pair()
    }

    /// The full argv as display strings, element 0 rendered as the exec path.
    #[must_use]
    pub fn argv_lossy(&self) -> Vec<String> {
        std::iter::once(self.program.path())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy().into_owned())
            .collect()
    }

    /// Short label for logs and errors.
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program.path().to_string_lossy().into_owned()
    }

    /// Build the `std::process::Command` that executes this command.
    ///
    /// The executable is passed to `Command::new` and, on Unix, the argv0
    /// slot is set with `CommandExt::arg0`. Arguments go through `args`.
    /// Stdio is left for the caller to wire up.
    pub(crate) fn to_std_command(&self, spawn: &SpawnOptions) -> StdCommand {
        let mut cmd = StdCommand::new(self.program.path());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(self.program.argv0());
        }

        cmd.args(&self.args);
        spawn.apply(&mut cmd);
        cmd
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_command(self))
    }
}

/// Return a sanitized copy of `command`, leaving the caller's value untouched.
#[must_use]
pub fn sanitize(command: &Command) -> Command {
    command.clone().sanitize()
}
