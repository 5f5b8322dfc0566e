//! Command modules for the pseudoc CLI.

pub mod common;
pub mod traits;

pub mod compile;
pub mod repl;
pub mod run;

pub use compile::{CompileArgs, CompileCommand, EmitKind};
pub use repl::ReplCommand;
pub use run::{RunArgs, RunCommand};
