//! `pseudoc run` — compile and execute a program to completion
//! (`spec.md` §5's batch mode) or interactively (driver mode, suspending
//! at each `INPUT`).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, instrument};

use pseudoc_drv::DriverOutcome;

use crate::commands::common::{read_source, OutputFormat};
use crate::commands::traits::{Command, CommandDescription};
use crate::config::Config;
use crate::error::Result;

/// Arguments for the run command.
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Path to the pseudoc source file.
    pub source: PathBuf,
    /// Run the peephole optimiser before executing.
    pub optimize: bool,
    /// Seed `RAND` for a reproducible run.
    pub seed: Option<u64>,
    /// Drive execution interactively instead of queuing stdin up front.
    pub interactive: bool,
    /// Output rendering.
    pub format: OutputFormat,
}

/// Everything a run prints, in a shape that can be rendered as text or
/// serialised as JSON (`spec.md` §6's `RunResult`).
#[derive(Serialize)]
struct RunReport {
    output: Vec<String>,
    logs: Vec<String>,
}

pub struct RunCommand {
    args: RunArgs,
    config: Config,
}

impl RunCommand {
    pub fn with_config(args: RunArgs, config: Config) -> Self {
        Self { args, config }
    }

    #[instrument(level = "debug", skip(self), fields(source = %self.args.source.display()))]
    fn run_batch(&self) -> Result<i32> {
        let source = read_source(&self.args.source)?;
        let program = pseudoc_drv::compile(&source, self.args.optimize)?;
        debug!(instrs = program.instrs.len(), "compiled");

        if self.args.interactive {
            return self.run_interactive(&program);
        }

        let inputs = read_stdin_lines()?;
        let mut vm = program.vm_batch(inputs);
        if let Some(seed) = self.args.seed.or(self.config.rng_seed) {
            vm.seed_rng(seed);
        }
        vm.run_batch().map_err(|e| pseudoc_drv::CompileError::from_runtime(&e))?;
        self.report(vm.output(), &program.logs)
    }

    fn run_interactive(&self, program: &pseudoc_drv::CompiledProgram) -> Result<i32> {
        let mut vm = program.vm_interactive();
        if let Some(seed) = self.args.seed.or(self.config.rng_seed) {
            vm.seed_rng(seed);
        }
        let yield_every = self.config.driver_yield_every;
        let stdin = io::stdin();
        loop {
            let outcome = vm.run_driver(yield_every).map_err(|e| pseudoc_drv::CompileError::from_runtime(&e))?;
            match outcome {
                DriverOutcome::Finished => break,
                DriverOutcome::Yielded => continue,
                DriverOutcome::NeedsInput => {
                    print!("? ");
                    io::stdout().flush().ok();
                    let mut line = String::new();
                    stdin.lock().read_line(&mut line)?;
                    vm.resume_input(line.trim_end_matches(['\n', '\r']))
                        .map_err(|e| pseudoc_drv::CompileError::from_runtime(&e))?;
                }
            }
        }
        self.report(vm.output(), &program.logs)
    }

    fn report(&self, output: &[String], logs: &[String]) -> Result<i32> {
        match self.args.format {
            OutputFormat::Text => {
                for line in output {
                    println!("{line}");
                }
                for log in logs {
                    eprintln!("{log}");
                }
            }
            OutputFormat::Json => {
                let report = RunReport { output: output.to_vec(), logs: logs.to_vec() };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        info!(lines = output.len(), "run finished");
        Ok(0)
    }
}

/// Batch mode (`spec.md` §5) reads the whole of stdin up front as the
/// `INPUT` queue; `--interactive` is the escape hatch for a program that
/// needs to prompt as it goes.
fn read_stdin_lines() -> Result<Vec<String>> {
    let stdin = io::stdin();
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        lines.push(line?);
    }
    Ok(lines)
}

impl Command for RunCommand {
    type Args = RunArgs;

    fn new(args: Self::Args) -> Self {
        Self { args, config: Config::default() }
    }

    fn execute(&self) -> Result<i32> {
        self.run_batch()
    }

    fn name() -> &'static str {
        "run"
    }
}

impl CommandDescription for RunCommand {
    fn description() -> &'static str {
        "Compile and execute a pseudoc program"
    }
}
