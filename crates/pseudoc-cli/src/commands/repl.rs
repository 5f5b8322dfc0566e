//! `pseudoc repl` — a line-oriented read-eval-print loop.
//!
//! Pseudoc programs are block-structured (`IF...ENDIF`, `FOR...NEXT`), so
//! there is no single-statement REPL the way there is for an expression
//! language. Instead each submission is a whole program: the user types
//! lines until a blank line, the accumulated text is compiled and run in
//! a fresh [`pseudoc_vm::Vm`], and the cycle repeats. `:quit` ends the
//! session.

use std::io::{self, BufRead, Write};

use tracing::instrument;

use crate::config::Config;
use crate::error::Result;

pub struct ReplCommand {
    config: Config,
}

impl ReplCommand {
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn run(&self) -> Result<i32> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        println!("pseudoc repl -- type a program, blank line to run, :quit to exit");

        loop {
            print!("pseudoc> ");
            stdout.flush().ok();

            let mut source = String::new();
            loop {
                let mut line = String::new();
                let read = stdin.lock().read_line(&mut line)?;
                if read == 0 {
                    println!();
                    return Ok(0);
                }
                let trimmed = line.trim_end_matches(['\n', '\r']);
                if trimmed == ":quit" {
                    return Ok(0);
                }
                if trimmed.is_empty() {
                    break;
                }
                source.push_str(trimmed);
                source.push('\n');
                print!("...      ");
                stdout.flush().ok();
            }

            if source.trim().is_empty() {
                continue;
            }

            self.eval(&source);
        }
    }

    fn eval(&self, source: &str) {
        match pseudoc_drv::run(source, self.config.optimize, Vec::new(), Vec::new()) {
            Ok(outcome) => {
                for line in &outcome.output {
                    println!("{line}");
                }
            }
            Err(e) => eprintln!("{}", e.diagnostic),
        }
    }
}
