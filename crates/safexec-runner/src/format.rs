//! Debug rendering of commands and pipelines
//!
//! Produces a string that, pasted into a POSIX shell, runs an equivalent
//! pipeline. The rendering is for humans reading logs only; nothing in this
//! crate parses or executes it. Spawn options (environment, working
//! directory) are not represented.

use crate::command::Command;

const PIPE_JOIN: &str = "\" | \"";
const ARG_JOIN: &str = "\" \"";

fn escape_quotes(arg: &str) -> String {
    arg.replace('"', "\\\"")
}

/// Escape and join the arguments of one command, without the outer quotes.
fn join_args(command: &Command) -> String {
    command
        .argv_lossy()
        .iter()
        .map(|arg| escape_quotes(arg))
        .collect::<Vec<_>>()
        .join(ARG_JOIN)
}

/// Render a single command, e.g. `"echo" "hi"`.
#[must_use]
pub fn format_command(command: &Command) -> String {
    format_command_list(std::slice::from_ref(command))
}

/// Render a command list as one quoted pipeline.
///
/// Every argument is wrapped in double quotes with embedded quotes escaped;
/// arguments are joined by a space and commands by `" | "`.
///
/// ```rust
/// use safexec_runner::{Command, format_command_list};
///
/// let list = [
///     Command::new("printf").arg("a\nb\n"),
///     Command::new("grep").arg("b"),
/// ];
/// assert_eq!(
///     format_command_list(&list),
///     "\"printf\" \"a\nb\n\" | \"grep\" \"b\""
/// );
/// ```
#[must_use]
pub fn format_command_list(commands: &[Command]) -> String {
    let joined = commands
        .iter()
        .map(join_args)
        .collect::<Vec<_>>()
        .join(PIPE_JOIN);
    format!("\"{joined}\"")
}
