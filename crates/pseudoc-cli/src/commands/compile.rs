//! `pseudoc compile` — run the pipeline up to IR generation without
//! executing anything (`spec.md` §6's pure `compile(...)` entry point).

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::commands::common::{read_source, OutputFormat};
use crate::commands::traits::{Command, CommandDescription};
use crate::config::Config;
use crate::error::Result;

/// What a `compile` invocation should print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitKind {
    Tokens,
    Ast,
    Ir,
}

impl EmitKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tokens" => Some(Self::Tokens),
            "ast" => Some(Self::Ast),
            "ir" => Some(Self::Ir),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileArgs {
    pub source: PathBuf,
    pub optimize: bool,
    pub emit: EmitKind,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct CompileReport {
    tokens: Option<String>,
    ast: Option<String>,
    ir: String,
    logs: Vec<String>,
}

pub struct CompileCommand {
    args: CompileArgs,
    #[allow(dead_code)]
    config: Config,
}

impl CompileCommand {
    pub fn with_config(args: CompileArgs, config: Config) -> Self {
        Self { args, config }
    }

    #[instrument(level = "debug", skip(self), fields(source = %self.args.source.display()))]
    fn run(&self) -> Result<i32> {
        let source = read_source(&self.args.source)?;
        let program = pseudoc_drv::compile(&source, self.args.optimize)?;
        debug!(instrs = program.instrs.len(), "compiled");

        match self.args.format {
            OutputFormat::Text => {
                match self.args.emit {
                    EmitKind::Tokens => println!("{}", program.tokens_text()),
                    EmitKind::Ast => println!("{}", program.ast_text()),
                    EmitKind::Ir => println!("{}", program.ir_text()),
                }
                for log in &program.logs {
                    eprintln!("{log}");
                }
            }
            OutputFormat::Json => {
                let report = CompileReport {
                    tokens: matches!(self.args.emit, EmitKind::Tokens).then(|| program.tokens_text()),
                    ast: matches!(self.args.emit, EmitKind::Ast).then(|| program.ast_text()),
                    ir: program.ir_text(),
                    logs: program.logs.clone(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Ok(0)
    }
}

impl Command for CompileCommand {
    type Args = CompileArgs;

    fn new(args: Self::Args) -> Self {
        Self { args, config: Config::default() }
    }

    fn execute(&self) -> Result<i32> {
        self.run()
    }

    fn name() -> &'static str {
        "compile"
    }
}

impl CommandDescription for CompileCommand {
    fn description() -> &'static str {
        "Lex, parse, check, and lower a pseudoc program without running it"
    }
}
