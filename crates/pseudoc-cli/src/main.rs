//! pseudoc - a command-line front end for the pseudoc compiler/interpreter.
//!
//! Parses arguments, wires up logging and configuration, and dispatches to
//! one of the `run`, `compile`, or `repl` subcommands (`spec.md` §6).

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::common::OutputFormat;
use commands::{CompileArgs, CompileCommand, EmitKind, ReplCommand, RunArgs, RunCommand};
use config::Config;
use error::{CliError, Result};

/// pseudoc - compiler and interpreter for the CIE-style teaching
/// pseudocode language.
#[derive(Parser, Debug)]
#[command(name = "pseudoc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiler and interpreter for pseudoc", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true, env = "PSEUDOC_VERBOSE")]
    verbose: bool,

    /// Path to a pseudoc.toml configuration file (defaults to ./pseudoc.toml).
    #[arg(short, long, global = true, env = "PSEUDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Disable ANSI colour in log output.
    #[arg(long, global = true, env = "PSEUDOC_NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile and execute a pseudoc program.
    Run(RunCommandArgs),
    /// Lex, parse, check, and lower a program without running it.
    Compile(CompileCommandArgs),
    /// Start an interactive read-eval-print loop.
    Repl,
}

#[derive(Parser, Debug)]
struct RunCommandArgs {
    /// Path to the pseudoc source file.
    source: PathBuf,

    /// Disable the peephole optimiser for this run.
    #[arg(long, default_value_t = false)]
    no_optimize: bool,

    /// Seed RAND for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Drive execution interactively, prompting at each INPUT.
    #[arg(short, long, default_value_t = false)]
    interactive: bool,

    /// Output rendering: text or json.
    #[arg(short, long)]
    format: Option<String>,
}

#[derive(Parser, Debug)]
struct CompileCommandArgs {
    /// Path to the pseudoc source file.
    source: PathBuf,

    /// Disable the peephole optimiser.
    #[arg(long, default_value_t = false)]
    no_optimize: bool,

    /// What to print: tokens, ast, or ir (default ir).
    #[arg(short, long)]
    emit: Option<String>,

    /// Output rendering: text or json.
    #[arg(short, long)]
    format: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    match run_cli(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn run_cli(cli: Cli) -> Result<i32> {
    init_logging(cli.verbose, cli.no_color)?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => {
            let run_args = RunArgs {
                source: args.source,
                optimize: !args.no_optimize,
                seed: args.seed,
                interactive: args.interactive,
                format: resolve_format(args.format, &config)?,
            };
            RunCommand::with_config(run_args, config).execute()
        }
        Commands::Compile(args) => {
            let compile_args = CompileArgs {
                source: args.source,
                optimize: !args.no_optimize,
                emit: args
                    .emit
                    .as_deref()
                    .map(|s| EmitKind::from_str(s).ok_or_else(|| CliError::Config(format!("unknown --emit value: {s}"))))
                    .transpose()?
                    .unwrap_or(EmitKind::Ir),
                format: resolve_format(args.format, &config)?,
            };
            CompileCommand::with_config(compile_args, config).execute()
        }
        Commands::Repl => ReplCommand::with_config(config).run(),
    }
}

fn resolve_format(flag: Option<String>, config: &Config) -> Result<OutputFormat> {
    let raw = flag.unwrap_or_else(|| config.format.clone());
    OutputFormat::from_str(&raw).ok_or_else(|| CliError::Config(format!("unknown --format value: {raw}")))
}

fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };

    let subscriber = fmt::layer()
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| CliError::Config(format!("failed to initialize logging: {e}")))?;

    Ok(())
}

fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}
