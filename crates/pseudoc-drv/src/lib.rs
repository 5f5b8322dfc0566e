//! Compiler facade (`spec.md` §4, "Compiler façade"; §6 "Host interface").
//!
//! Every other crate in the workspace implements one stage of the
//! pipeline and knows nothing about the others' error-reporting
//! conventions; this crate is the one place that wires lexer → parser →
//! analyser → generator → optimiser → VM together behind the two
//! entry points `spec.md` §6 promises a host: [`compile`] (pure, no
//! execution) and [`run`] (compile, then execute to completion in batch
//! mode). Driver-mode (suspend-at-`INPUT`) hosts skip `run` and drive
//! [`pseudoc_vm::Vm`] directly through a [`CompiledProgram`], since that
//! needs a live `Vm` handle rather than a one-shot result value.

use pseudoc_util::{Diagnostic, Handler, Interner, Stage};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

pub use pseudoc_ir::{render_program, Instr};
pub use pseudoc_par::Program;
pub use pseudoc_vm::{DriverOutcome, RuntimeError, Value, Vm};
use pseudoc_vm::VirtualFile;

/// One compilation's full diagnostic outcome: the `Diagnostic` that
/// aborted the pipeline (`spec.md` §7: "the first error in a stage
/// aborts the pipeline and is surfaced"), plus the exit code a CLI host
/// should use (`spec.md` §6).
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("{diagnostic}")]
pub struct CompileError {
    pub diagnostic: Diagnostic,
}

impl CompileError {
    fn new(diagnostic: Diagnostic) -> Self {
        Self { diagnostic }
    }

    /// Wrap a live [`RuntimeError`] as a `RuntimeError`-stage diagnostic,
    /// for hosts driving a [`Vm`] directly instead of calling [`run`].
    pub fn from_runtime(err: &RuntimeError) -> Self {
        Self::new(Diagnostic::error(Stage::Runtime, err.to_string(), pseudoc_util::Span::DUMMY))
    }

    /// `spec.md` §6: "Exit codes (if exposed via CLI): 0 success; 1
    /// LexError; 2 ParseError; 3 TypeError; 4 RuntimeError."
    pub fn exit_code(&self) -> i32 {
        match self.diagnostic.stage.as_str() {
            "LexError" => 1,
            "ParseError" => 2,
            "TypeError" => 3,
            "RuntimeError" => 4,
            _ => 1,
        }
    }
}

/// The fully lexed, parsed, checked, lowered, and (optionally)
/// optimised form of one program, plus the `Interner` its symbols and
/// IR string operands are indexed into. A host keeps this alive for as
/// long as it wants to build `Vm`s from it — `Vm::new_batch`/
/// `Vm::new_interactive` both borrow `&Interner`, so the interner has
/// to outlive every `Vm` built from one compilation (`spec.md` §5: "each
/// compilation creates fresh lexer/parser/analyser/generator instances").
pub struct CompiledProgram {
    pub tokens: Vec<pseudoc_lex::Token>,
    pub interner: Interner,
    pub ast: Program,
    pub instrs: Vec<Instr>,
    /// Non-fatal diagnostics accumulated by the analyser (e.g. unused
    /// declarations), rendered as display strings for the host log.
    pub logs: Vec<String>,
}

impl CompiledProgram {
    /// The canonical textual IR dump `spec.md` §9 calls the "normative
    /// contract" a host can inspect or diff against.
    pub fn ir_text(&self) -> String {
        render_program(&self.instrs, &self.interner)
    }

    /// A debug dump of the parsed tree, for a host's `--emit ast` view.
    pub fn ast_text(&self) -> String {
        format!("{:#?}", self.ast)
    }

    /// One rendered line per token, for a host's `--emit tokens` view.
    pub fn tokens_text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| format!("{:?} {:?} @{}", t.kind, self.interner.resolve(t.lexeme), t.span))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Synchronous run-to-completion mode (`spec.md` §5): `inputs` is a
    /// finite queue; `INPUT` fails once it runs dry.
    pub fn vm_batch(&self, inputs: Vec<String>) -> Vm<'_> {
        Vm::new_batch(self.instrs.clone(), &self.interner, inputs)
    }

    /// Driver mode (`spec.md` §5): `INPUT` suspends the returned `Vm`
    /// via [`DriverOutcome::NeedsInput`] rather than failing.
    pub fn vm_interactive(&self) -> Vm<'_> {
        Vm::new_interactive(self.instrs.clone(), &self.interner)
    }
}

/// `compile(source, {optimize}) → { tokens, ast, ir, logs }` (`spec.md`
/// §6). Pure: no I/O, no execution. Stops at the first error in
/// whichever stage produced it, per `spec.md` §7.
#[instrument(level = "debug", skip(source), fields(source_len = source.len()))]
pub fn compile(source: &str, optimize: bool) -> Result<CompiledProgram, CompileError> {
    let mut interner = Interner::new();
    let mut handler = Handler::new();

    let tokens = pseudoc_lex::Lexer::new(source, &mut interner, &mut handler).tokenize();
    if let Some(diag) = handler.take_error() {
        debug!(stage = "lex", %diag, "compile aborted");
        return Err(CompileError::new(diag));
    }
    debug!(tokens = tokens.len(), "lexed");

    let ast = pseudoc_par::Parser::new(tokens.clone(), &interner, &mut handler)
        .parse()
        .ok_or_else(|| CompileError::new(handler.error_ref().cloned().unwrap_or_else(|| {
            Diagnostic::error(Stage::Parse, "parsing failed with no diagnostic recorded", pseudoc_util::Span::DUMMY)
        })))?;
    if let Some(diag) = handler.take_error() {
        debug!(stage = "parse", %diag, "compile aborted");
        return Err(CompileError::new(diag));
    }
    debug!(statements = ast.len(), "parsed");

    pseudoc_sem::analyze(&ast, &interner, &mut handler);
    if let Some(diag) = handler.take_error() {
        debug!(stage = "sema", %diag, "compile aborted");
        return Err(CompileError::new(diag));
    }
    debug!("analysed");

    let mut instrs = pseudoc_ir::generate(&ast, &interner);
    debug!(instrs = instrs.len(), "lowered");
    if optimize {
        pseudoc_opt::optimize(&mut instrs);
        debug!(instrs = instrs.len(), "optimised");
    }

    let logs = handler.warnings().iter().map(|w| w.to_string()).collect();
    Ok(CompiledProgram { tokens, interner, ast, instrs, logs })
}

/// Everything `spec.md` §6's `run(...)` promises after a batch
/// execution: the rendered IR, the collected `OUTPUT` lines, the final
/// globals (by name, for a host that has no use for `Symbol`/`Interner`
/// plumbing of its own), the virtual filesystem, and the diagnostic log.
pub struct RunOutcome {
    pub ir: String,
    pub output: Vec<String>,
    pub globals: FxHashMap<String, Value>,
    pub files: FxHashMap<String, VirtualFile>,
    pub logs: Vec<String>,
}

/// `run(source, {optimize, inputs, files}) → { ir, output, globals,
/// files, logs }` (`spec.md` §6) in batch mode. `files` pre-populates
/// the virtual filesystem before execution (`spec.md` §1: "a
/// virtual-file map that the host may pre-populate and inspect
/// afterward").
#[instrument(level = "debug", skip(source, inputs, files), fields(source_len = source.len()))]
pub fn run(
    source: &str,
    optimize: bool,
    inputs: Vec<String>,
    files: Vec<(String, Vec<String>)>,
) -> Result<RunOutcome, CompileError> {
    let program = compile(source, optimize)?;
    let ir = program.ir_text();
    let mut vm = program.vm_batch(inputs);
    for (name, lines) in files {
        vm.vfs_mut().seed(name, lines);
    }
    vm.run_batch().map_err(|e| {
        debug!(stage = "runtime", error = %e, "run aborted");
        CompileError::new(Diagnostic::error(Stage::Runtime, e.to_string(), pseudoc_util::Span::DUMMY))
    })?;

    let globals = vm
        .globals()
        .iter()
        .map(|(sym, val)| (program.interner.resolve(*sym).to_string(), val.clone()))
        .collect();
    let files = vm.vfs().files().clone();
    debug!(output_lines = vm.output().len(), "run finished");

    Ok(RunOutcome { ir, output: vm.output().to_vec(), globals, files, logs: program.logs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_reports_ir_and_ast_for_a_well_typed_program() {
        let program = compile("DECLARE X : INTEGER\nX <- 2 + 3 * 4\nOUTPUT X\n", true).unwrap();
        assert_eq!(program.ast.len(), 3);
        assert!(program.ir_text().contains("OUTPUT"));
    }

    #[test]
    fn lex_error_surfaces_with_exit_code_one() {
        let err = compile("DECLARE X : INTEGER\nX <- 1 ~ 2\n", false).unwrap_err();
        assert_eq!(err.diagnostic.stage, "LexError");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn use_before_assignment_is_a_type_error_with_exit_code_three() {
        let err = compile("DECLARE X : INTEGER\nOUTPUT X\n", false).unwrap_err();
        assert_eq!(err.diagnostic.stage, "TypeError");
        assert!(err.diagnostic.message.contains('X'));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn division_by_zero_surfaces_as_a_runtime_error_with_exit_code_four() {
        let err = run("DECLARE X : INTEGER\nX <- 1 / 0\n", true, Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err.diagnostic.stage, "RuntimeError");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn run_collects_output_globals_and_files() {
        let outcome = run(
            "DECLARE X : INTEGER\n\
             OPENFILE \"Out.txt\" FOR WRITE\n\
             X <- 41\n\
             X <- X + 1\n\
             WRITEFILE \"Out.txt\", NUM_TO_STR(X)\n\
             CLOSEFILE \"Out.txt\"\n\
             OUTPUT X\n",
            true,
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(outcome.output, ["42"]);
        assert_eq!(outcome.globals.get("X"), Some(&Value::Int(42)));
        assert_eq!(outcome.files.get("Out.txt").unwrap().lines, vec!["42"]);
    }

    #[test]
    fn run_seeds_pre_populated_files_before_execution() {
        let outcome = run(
            "DECLARE Line : STRING\n\
             OPENFILE \"In.txt\" FOR READ\n\
             READFILE \"In.txt\", Line\n\
             CLOSEFILE \"In.txt\"\n\
             OUTPUT Line\n",
            true,
            Vec::new(),
            vec![("In.txt".to_string(), vec!["hello".to_string()])],
        )
        .unwrap();
        assert_eq!(outcome.output, ["hello"]);
    }

    #[test]
    fn optimiser_does_not_change_observable_output() {
        let src = "DECLARE X : INTEGER\nX <- 2 + 3 * 4\nOUTPUT X\n";
        let with_opt = run(src, true, Vec::new(), Vec::new()).unwrap();
        let without_opt = run(src, false, Vec::new(), Vec::new()).unwrap();
        assert_eq!(with_opt.output, without_opt.output);
    }

    #[test]
    fn optimiser_does_not_change_output_for_a_real_operand_through_mod() {
        // MOD is statically INTEGER even with a REAL operand (`spec.md`
        // §4.3); constant-folding `5.5 MOD 2` must agree with the VM's
        // own `IntMod` evaluation or optimiser soundness (`spec.md` §8)
        // breaks for this operator.
        let src = "OUTPUT 5.5 MOD 2\n";
        let with_opt = run(src, true, Vec::new(), Vec::new()).unwrap();
        let without_opt = run(src, false, Vec::new(), Vec::new()).unwrap();
        assert_eq!(with_opt.output, without_opt.output);
        assert_eq!(with_opt.output, ["1"]);
    }

    #[test]
    fn driver_mode_is_reachable_through_compiled_program() {
        let program = compile("DECLARE X : INTEGER\nINPUT X\nOUTPUT X\n", true).unwrap();
        let mut vm = program.vm_interactive();
        assert_eq!(vm.run_driver(1_000).unwrap(), DriverOutcome::NeedsInput);
        vm.resume_input("7").unwrap();
        assert_eq!(vm.run_driver(1_000).unwrap(), DriverOutcome::Finished);
        assert_eq!(vm.output(), ["7"]);
    }
}
