//! Command trait shared by the pseudoc subcommands.

use crate::error::Result;

/// Standard command trait every pseudoc subcommand implements, for
/// consistent construction/execution/naming across `run`, `compile`, and
/// `repl`.
pub trait Command {
    /// The arguments type for this command.
    type Args;

    /// Create a new command instance with the given arguments.
    fn new(args: Self::Args) -> Self;

    /// Execute the command against stdout/stderr, returning the process
    /// exit code on success (`spec.md` §6's exit-code contract; commands
    /// that fail return `Err` instead).
    fn execute(&self) -> Result<i32>;

    /// The subcommand name as it appears on the command line.
    fn name() -> &'static str;
}

/// Short description shown in `--help`.
pub trait CommandDescription {
    fn description() -> &'static str;
}
