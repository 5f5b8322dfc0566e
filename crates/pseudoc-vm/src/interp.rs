//! Execution loop (`spec.md` §4.6, §5).

use crate::error::{RuntimeError, RuntimeResult};
use crate::scope::Scopes;
use crate::value::{ArrayValue, Value};
use crate::vfs::VirtualFileSystem;
use pseudoc_ir::{Instr, Label, Operand, Place};
use pseudoc_par::BinOp;
use pseudoc_util::{Interner, Symbol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// `spec.md` §4.6: "A safety counter caps execution at 10,000,000 steps."
pub const MAX_STEPS: u64 = 10_000_000;

enum Flow {
    Next,
    Jumped,
}

enum InputMode {
    Batch(VecDeque<String>),
    Interactive,
}

/// Outcome of one `run_driver` slice (`spec.md` §5's driver run mode).
#[derive(Debug, PartialEq)]
pub enum DriverOutcome {
    /// The yield budget was consumed; call `run_driver` again to continue.
    Yielded,
    /// Execution is paused at an `INPUT`; call `resume_input` with the
    /// host-supplied value, then call `run_driver` again.
    NeedsInput,
    Finished,
}

pub struct Vm<'a> {
    instrs: Vec<Instr>,
    interner: &'a Interner,
    labels: FxHashMap<Label, usize>,
    pc: usize,
    call_stack: Vec<usize>,
    arg_stack: Vec<Value>,
    ref_stack: Vec<Option<Place>>,
    scopes: Scopes,
    retval: Option<Value>,
    vfs: VirtualFileSystem,
    output: Vec<String>,
    output_buf: String,
    input: InputMode,
    rng: StdRng,
    halt: bool,
    steps: u64,
}

impl<'a> Vm<'a> {
    fn new(instrs: Vec<Instr>, interner: &'a Interner, input: InputMode) -> Self {
        let labels = index_labels(&instrs);
        Self {
            instrs,
            interner,
            labels,
            pc: 0,
            call_stack: Vec::new(),
            arg_stack: Vec::new(),
            ref_stack: Vec::new(),
            scopes: Scopes::new(),
            retval: None,
            vfs: VirtualFileSystem::new(),
            output: Vec::new(),
            output_buf: String::new(),
            input,
            rng: StdRng::seed_from_u64(0),
            halt: false,
            steps: 0,
        }
    }

    /// Synchronous run-to-completion mode (`spec.md` §5): `INPUT`
    /// pulls from a pre-queued list and fails if it runs dry.
    pub fn new_batch(instrs: Vec<Instr>, interner: &'a Interner, inputs: Vec<String>) -> Self {
        Self::new(instrs, interner, InputMode::Batch(inputs.into_iter().collect()))
    }

    /// Driver mode (`spec.md` §5): `INPUT` suspends via [`DriverOutcome::NeedsInput`].
    pub fn new_interactive(instrs: Vec<Instr>, interner: &'a Interner) -> Self {
        Self::new(instrs, interner, InputMode::Interactive)
    }

    /// `spec.md` §9: "`RAND` must be seedable for determinism in tests."
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn vfs_mut(&mut self) -> &mut VirtualFileSystem {
        &mut self.vfs
    }

    pub fn vfs(&self) -> &VirtualFileSystem {
        &self.vfs
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn globals(&self) -> &FxHashMap<Symbol, Value> {
        &self.scopes.globals
    }

    /// `spec.md` §5: "A single `halt` flag on the VM is checked on each
    /// driver-mode iteration; setting it causes the current or next
    /// awaited `INPUT` to fail with a *cancelled* error."
    pub fn cancel(&mut self) {
        self.halt = true;
    }

    pub fn run_batch(&mut self) -> RuntimeResult<()> {
        while self.pc < self.instrs.len() {
            self.step_one()?;
        }
        Ok(())
    }

    /// Executes at most `yield_every` instructions, or fewer if `INPUT`
    /// is reached or the program finishes, matching `spec.md` §5's
    /// "yields cooperatively every N steps (host-chosen, default 1,000)."
    pub fn run_driver(&mut self, yield_every: u64) -> RuntimeResult<DriverOutcome> {
        if self.halt {
            return Err(RuntimeError::Cancelled);
        }
        let mut executed = 0;
        loop {
            if self.pc >= self.instrs.len() {
                return Ok(DriverOutcome::Finished);
            }
            if matches!(&self.instrs[self.pc], Instr::Input { .. }) && matches!(self.input, InputMode::Interactive) {
                return Ok(DriverOutcome::NeedsInput);
            }
            self.step_one()?;
            executed += 1;
            if executed >= yield_every {
                return Ok(DriverOutcome::Yielded);
            }
        }
    }

    /// Supplies the value a paused `INPUT` is waiting for, stores it,
    /// and advances past it.
    pub fn resume_input(&mut self, raw: &str) -> RuntimeResult<()> {
        let Instr::Input { target } = self.instrs[self.pc].clone() else {
            return Err(RuntimeError::InputExhausted);
        };
        self.store(&target, Value::from_input(raw))?;
        self.pc += 1;
        Ok(())
    }

    fn step_one(&mut self) -> RuntimeResult<()> {
        if self.halt {
            return Err(RuntimeError::Cancelled);
        }
        self.steps += 1;
        if self.steps > MAX_STEPS {
            return Err(RuntimeError::StepLimitExceeded(MAX_STEPS));
        }
        let instr = self.instrs[self.pc].clone();
        match self.exec_instr(instr)? {
            Flow::Next => self.pc += 1,
            Flow::Jumped => {}
        }
        Ok(())
    }

    fn resolve_label(&self, label: &Label) -> RuntimeResult<usize> {
        self.labels.get(label).copied().ok_or_else(|| RuntimeError::UndefinedLabel(label.render(self.interner)))
    }

    fn name_of(&self, name: Symbol) -> String {
        self.interner.resolve(name).to_string()
    }

    fn exec_instr(&mut self, instr: Instr) -> RuntimeResult<Flow> {
        match instr {
            Instr::AssignOperand { dst, src } => {
                let v = self.resolve(&src)?;
                self.scopes.set_temp(dst, v);
                Ok(Flow::Next)
            }
            Instr::BinaryOp { dst, op, lhs, rhs } => {
                let l = self.resolve(&lhs)?;
                let r = self.resolve(&rhs)?;
                let v = eval_binop(op, &l, &r)?;
                self.scopes.set_temp(dst, v);
                Ok(Flow::Next)
            }
            Instr::Builtin { dst, name, args } => {
                let arg_vals = args.iter().map(|a| self.resolve(a)).collect::<RuntimeResult<Vec<_>>>()?;
                let v = self.call_builtin(name, &arg_vals)?;
                self.scopes.set_temp(dst, v);
                Ok(Flow::Next)
            }
            Instr::Store { place, value } => {
                let v = self.resolve(&value)?;
                self.store(&place, v)?;
                Ok(Flow::Next)
            }
            Instr::Array { name, dims } => {
                self.scopes.set_var(name, Value::Array(ArrayValue::new(dims)));
                Ok(Flow::Next)
            }
            Instr::Local { name } => {
                self.scopes.declare_local(name, Value::Int(0));
                Ok(Flow::Next)
            }
            Instr::Output { value } => {
                let v = self.resolve(&value)?;
                self.output.push(v.to_string());
                Ok(Flow::Next)
            }
            Instr::OutputPart { value } => {
                let v = self.resolve(&value)?;
                self.output_buf.push_str(&v.to_string());
                Ok(Flow::Next)
            }
            Instr::OutputEnd => {
                let line = std::mem::take(&mut self.output_buf);
                self.output.push(line);
                Ok(Flow::Next)
            }
            Instr::Input { target } => match &mut self.input {
                InputMode::Batch(queue) => {
                    let raw = queue.pop_front().ok_or(RuntimeError::InputExhausted)?;
                    self.store(&target, Value::from_input(&raw))?;
                    Ok(Flow::Next)
                }
                InputMode::Interactive => {
                    unreachable!("run_driver intercepts INPUT before it reaches exec_instr")
                }
            },
            Instr::Goto { label } => {
                self.pc = self.resolve_label(&label)?;
                Ok(Flow::Jumped)
            }
            Instr::IfZero { value, label } => {
                let v = self.resolve(&value)?;
                if v.is_falsy() {
                    self.pc = self.resolve_label(&label)?;
                    Ok(Flow::Jumped)
                } else {
                    Ok(Flow::Next)
                }
            }
            Instr::IfNonZero { value, label } => {
                let v = self.resolve(&value)?;
                if !v.is_falsy() {
                    self.pc = self.resolve_label(&label)?;
                    Ok(Flow::Jumped)
                } else {
                    Ok(Flow::Next)
                }
            }
            Instr::Push { value } => {
                let v = self.resolve(&value)?;
                self.arg_stack.push(v);
                Ok(Flow::Next)
            }
            Instr::PushRef { target } => {
                self.ref_stack.push(target);
                Ok(Flow::Next)
            }
            Instr::EnterScope => {
                self.scopes.enter_scope();
                Ok(Flow::Next)
            }
            Instr::ExitScope => {
                self.scopes.exit_scope();
                Ok(Flow::Next)
            }
            Instr::PopParam { name } => {
                let v = self.arg_stack.pop().ok_or(RuntimeError::CallStackUnderflow)?;
                self.ref_stack.pop();
                if let Some(frame) = self.scopes.current_frame_mut() {
                    frame.locals.insert(name, v);
                }
                Ok(Flow::Next)
            }
            Instr::PopByRef { name } => {
                let v = self.arg_stack.pop().ok_or(RuntimeError::CallStackUnderflow)?;
                let r = self.ref_stack.pop().flatten();
                if let Some(frame) = self.scopes.current_frame_mut() {
                    frame.locals.insert(name, v);
                    if let Some(place) = r {
                        frame.byref_map.insert(name, place);
                    }
                }
                Ok(Flow::Next)
            }
            Instr::WritebackByRef { name } => {
                let frame = self.scopes.exit_scope().ok_or(RuntimeError::CallStackUnderflow)?;
                let value = frame.locals.get(&name).cloned().unwrap_or(Value::Int(0));
                let place = frame.byref_map.get(&name).cloned();
                self.scopes.frames.push(frame);
                if let Some(place) = place {
                    self.store(&place, value)?;
                }
                Ok(Flow::Next)
            }
            Instr::Call { label } => {
                self.call_stack.push(self.pc + 1);
                self.pc = self.resolve_label(&label)?;
                Ok(Flow::Jumped)
            }
            Instr::SetRetVal { value } => {
                let v = self.resolve(&value)?;
                self.retval = Some(v);
                Ok(Flow::Next)
            }
            Instr::Ret => {
                let addr = self.call_stack.pop().ok_or(RuntimeError::CallStackUnderflow)?;
                self.pc = addr;
                Ok(Flow::Jumped)
            }
            Instr::OpenFile { name, mode } => {
                let n = self.resolve(&name)?.to_string();
                self.vfs.open(&n, mode);
                Ok(Flow::Next)
            }
            Instr::ReadFile { name, target } => {
                let n = self.resolve(&name)?.to_string();
                let line = self.vfs.read_line(&n)?;
                self.store(&target, Value::Str(line))?;
                Ok(Flow::Next)
            }
            Instr::WriteFile { name, value } => {
                let n = self.resolve(&name)?.to_string();
                let v = self.resolve(&value)?;
                self.vfs.write_line(&n, v.to_string())?;
                Ok(Flow::Next)
            }
            Instr::CloseFile { name } => {
                let n = self.resolve(&name)?.to_string();
                self.vfs.close(&n);
                Ok(Flow::Next)
            }
            Instr::Label(_) => Ok(Flow::Next),
        }
    }

    fn resolve_indices(&self, name: Symbol, indices: &[Operand]) -> RuntimeResult<Vec<i64>> {
        indices
            .iter()
            .map(|i| {
                self.resolve(i)?.as_int().ok_or_else(|| RuntimeError::NotNumeric(self.name_of(name)))
            })
            .collect()
    }

    fn resolve(&self, operand: &Operand) -> RuntimeResult<Value> {
        match operand {
            Operand::Int(n) => Ok(Value::Int(*n)),
            Operand::Real(n) => Ok(Value::Real(*n)),
            Operand::Str(s) => Ok(Value::Str(self.interner.resolve(*s).to_string())),
            Operand::Bool(b) => Ok(Value::Bool(*b)),
            Operand::Var(name) => {
                self.scopes.get_var(*name).cloned().ok_or_else(|| RuntimeError::UndefinedVariable(self.name_of(*name)))
            }
            Operand::Temp(id) => self
                .scopes
                .get_temp(*id)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable(format!("T{id}"))),
            Operand::Index { name, indices } => {
                let idx = self.resolve_indices(*name, indices)?;
                let container =
                    self.scopes.get_var(*name).ok_or_else(|| RuntimeError::UndefinedVariable(self.name_of(*name)))?;
                match container {
                    Value::Array(arr) => arr
                        .get(&idx)
                        .cloned()
                        .ok_or_else(|| RuntimeError::IndexOutOfBounds { name: self.name_of(*name), indices: idx }),
                    _ => Err(RuntimeError::NotAnArray(self.name_of(*name))),
                }
            }
            Operand::Field { name, field } => {
                let container =
                    self.scopes.get_var(*name).ok_or_else(|| RuntimeError::UndefinedVariable(self.name_of(*name)))?;
                match container {
                    Value::Record(fields) => fields
                        .get(field)
                        .cloned()
                        .ok_or_else(|| RuntimeError::UndefinedVariable(self.name_of(*field))),
                    _ => Err(RuntimeError::NotARecord(self.name_of(*name))),
                }
            }
            Operand::RetVal => {
                self.retval.clone().ok_or_else(|| RuntimeError::UndefinedVariable("RETVAL".to_string()))
            }
        }
    }

    fn store(&mut self, place: &Place, value: Value) -> RuntimeResult<()> {
        match place {
            Place::Var(name) => {
                self.scopes.set_var(*name, value);
                Ok(())
            }
            Place::Index { name, indices } => {
                let idx = self.resolve_indices(*name, indices)?;
                let name_str = self.name_of(*name);
                let var = self.scopes.get_var_mut(*name).ok_or_else(|| RuntimeError::UndefinedVariable(name_str.clone()))?;
                match var {
                    Value::Array(arr) => arr
                        .set(&idx, value)
                        .ok_or(RuntimeError::IndexOutOfBounds { name: name_str, indices: idx }),
                    _ => Err(RuntimeError::NotAnArray(name_str)),
                }
            }
            Place::Field { name, field } => {
                if self.scopes.get_var(*name).is_none() {
                    self.scopes.set_var(*name, Value::Record(FxHashMap::default()));
                }
                let var = self
                    .scopes
                    .get_var_mut(*name)
                    .ok_or_else(|| RuntimeError::UndefinedVariable(self.name_of(*name)))?;
                match var {
                    Value::Record(fields) => {
                        fields.insert(*field, value);
                        Ok(())
                    }
                    _ => Err(RuntimeError::NotARecord(self.name_of(*name))),
                }
            }
        }
    }

    fn call_builtin(&mut self, name: &'static str, args: &[Value]) -> RuntimeResult<Value> {
        crate::builtins::call(self, name, args)
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

fn index_labels(instrs: &[Instr]) -> FxHashMap<Label, usize> {
    let mut labels = FxHashMap::default();
    for (i, instr) in instrs.iter().enumerate() {
        if let Instr::Label(l) = instr {
            labels.insert(*l, i);
        }
    }
    labels
}

/// `spec.md` §4.6 "Arithmetic semantics".
fn eval_binop(op: BinOp, lhs: &Value, rhs: &Value) -> RuntimeResult<Value> {
    use BinOp::*;
    match op {
        Add => {
            if matches!(lhs, Value::Str(_)) || matches!(rhs, Value::Str(_)) {
                Ok(Value::Str(format!("{lhs}{rhs}")))
            } else {
                numeric_op(lhs, rhs, |a, b| a + b, |a, b| a.wrapping_add(b))
            }
        }
        Sub => numeric_op(lhs, rhs, |a, b| a - b, |a, b| a.wrapping_sub(b)),
        Mul => numeric_op(lhs, rhs, |a, b| a * b, |a, b| a.wrapping_mul(b)),
        Div => {
            let a = number(lhs)?;
            let b = number(rhs)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Real(a / b))
        }
        Pow => {
            let a = number(lhs)?;
            let b = number(rhs)?;
            Ok(Value::Real(a.powf(b)))
        }
        IntDiv => {
            let a = number(lhs)?;
            let b = number(rhs)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Int((a / b).trunc() as i64))
        }
        IntMod => {
            let a = number(lhs)?;
            let b = number(rhs)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Int((a as i64).wrapping_rem(b as i64)))
        }
        Concat => Ok(Value::Str(format!("{lhs}{rhs}"))),
        Eq => Ok(Value::Bool(values_equal(lhs, rhs))),
        Ne => Ok(Value::Bool(!values_equal(lhs, rhs))),
        Lt | Gt | Le | Ge => compare(op, lhs, rhs),
        And => Ok(Value::Bool(!lhs.is_falsy() && !rhs.is_falsy())),
        Or => Ok(Value::Bool(!lhs.is_falsy() || !rhs.is_falsy())),
    }
}

fn number(v: &Value) -> RuntimeResult<f64> {
    v.as_number().ok_or_else(|| RuntimeError::NotNumeric(v.to_string()))
}

/// Typing table in `spec.md` §4.3: integer result unless either operand
/// is `REAL`.
fn numeric_op(lhs: &Value, rhs: &Value, real_op: impl Fn(f64, f64) -> f64, int_op: impl Fn(i64, i64) -> i64) -> RuntimeResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        _ => {
            let a = number(lhs)?;
            let b = number(rhs)?;
            Ok(Value::Real(real_op(a, b)))
        }
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn compare(op: BinOp, lhs: &Value, rhs: &Value) -> RuntimeResult<Value> {
    let ordering = if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
        a.cmp(b)
    } else {
        let a = number(lhs)?;
        let b = number(rhs)?;
        a.partial_cmp(&b).ok_or_else(|| RuntimeError::NotNumeric(lhs.to_string()))?
    };
    use std::cmp::Ordering::*;
    let result = match op {
        BinOp::Lt => ordering == Less,
        BinOp::Gt => ordering == Greater,
        BinOp::Le => ordering != Greater,
        BinOp::Ge => ordering != Less,
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pseudoc_lex::Lexer;
    use pseudoc_util::Handler;

    fn compile(src: &str) -> (Vec<Instr>, Interner) {
        let mut interner = Interner::new();
        let mut handler = Handler::new();
        let tokens = Lexer::new(src, &mut interner, &mut handler).tokenize();
        let program = pseudoc_par::Parser::new(tokens, &interner, &mut handler)
            .parse()
            .expect("program should parse");
        assert!(!handler.has_error(), "program should be well-typed: {:?}", handler.error_ref());
        pseudoc_sem::analyze(&program, &interner, &mut handler);
        assert!(!handler.has_error(), "program should be well-typed: {:?}", handler.error_ref());
        let mut instrs = pseudoc_ir::generate(&program, &interner);
        pseudoc_opt::optimize(&mut instrs);
        (instrs, interner)
    }

    /// Compiles and runs `src` to completion in batch mode and returns
    /// its collected `OUTPUT` lines.
    fn run_to_output(src: &str, inputs: &[&str]) -> Vec<String> {
        let (instrs, interner) = compile(src);
        let inputs = inputs.iter().map(|s| s.to_string()).collect();
        let mut vm = Vm::new_batch(instrs, &interner, inputs);
        vm.run_batch().expect("program should run to completion");
        vm.output().to_vec()
    }

    #[test]
    fn arithmetic_matches_the_typing_and_precedence_rules() {
        assert_eq!(run_to_output("OUTPUT 2 + 3 * 4", &[]), ["14"]);
    }

    #[test]
    fn byref_swap_exchanges_the_callers_variables() {
        let output = run_to_output(
            "PROCEDURE Swap(BYREF A : INTEGER, BYREF B : INTEGER)\n\
               DECLARE Tmp : INTEGER\n\
               Tmp <- A\n\
               A <- B\n\
               B <- Tmp\n\
             ENDPROCEDURE\n\
             DECLARE X : INTEGER\n\
             DECLARE Y : INTEGER\n\
             X <- 10\n\
             Y <- 20\n\
             CALL Swap(X, Y)\n\
             OUTPUT X\n\
             OUTPUT Y\n",
            &[],
        );
        assert_eq!(output, ["20", "10"]);
    }

    #[test]
    fn bubble_sort_produces_ascending_output() {
        let output = run_to_output(
            "DECLARE Nums : ARRAY[1:6] OF INTEGER\n\
             DECLARE I : INTEGER\n\
             DECLARE J : INTEGER\n\
             DECLARE Tmp : INTEGER\n\
             FOR I <- 1 TO 6\n\
               INPUT Nums[I]\n\
             NEXT I\n\
             FOR I <- 1 TO 5\n\
               FOR J <- 1 TO 6 - I\n\
                 IF Nums[J] > Nums[J + 1] THEN\n\
                   Tmp <- Nums[J]\n\
                   Nums[J] <- Nums[J + 1]\n\
                   Nums[J + 1] <- Tmp\n\
                 ENDIF\n\
               NEXT J\n\
             NEXT I\n\
             FOR I <- 1 TO 6\n\
               OUTPUT Nums[I]\n\
             NEXT I\n",
            &["5", "2", "9", "1", "7", "3"],
        );
        assert_eq!(output, ["1", "2", "3", "5", "7", "9"]);
    }

    #[test]
    fn for_loop_with_negative_step_counts_down() {
        let output = run_to_output(
            "DECLARE I : INTEGER\n\
             FOR I <- 5 TO 1 STEP -1\n\
               OUTPUT I\n\
             NEXT I\n",
            &[],
        );
        assert_eq!(output, ["5", "4", "3", "2", "1"]);
    }

    #[test]
    fn case_with_multiple_values_picks_the_matching_branch() {
        let output = run_to_output(
            "DECLARE Day : STRING\n\
             DECLARE D : INTEGER\n\
             D <- 6\n\
             CASE OF D\n\
               1, 2, 3, 4, 5: Day <- \"Weekday\"\n\
               6, 7: Day <- \"Weekend\"\n\
               OTHERWISE Day <- \"Other\"\n\
             ENDCASE\n\
             OUTPUT Day\n",
            &[],
        );
        assert_eq!(output, ["Weekend"]);
    }

    #[test]
    fn file_round_trip_reads_back_exactly_what_was_written() {
        let (instrs, interner) = compile(
            "DECLARE I : INTEGER\n\
             OPENFILE \"Log.txt\" FOR WRITE\n\
             FOR I <- 1 TO 5\n\
               WRITEFILE \"Log.txt\", \"Line \" & NUM_TO_STR(I)\n\
             NEXT I\n\
             CLOSEFILE \"Log.txt\"\n",
        );
        let mut vm = Vm::new_batch(instrs, &interner, Vec::new());
        vm.run_batch().expect("program should run to completion");
        let file = vm.vfs().files().get("Log.txt").expect("file should exist");
        assert_eq!(file.lines, vec!["Line 1", "Line 2", "Line 3", "Line 4", "Line 5"]);
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let (instrs, interner) = compile("DECLARE X : INTEGER\nX <- 1 / 0\n");
        let mut vm = Vm::new_batch(instrs, &interner, Vec::new());
        assert_eq!(vm.run_batch(), Err(RuntimeError::DivisionByZero));
    }

    #[test]
    fn array_index_out_of_bounds_is_a_runtime_error() {
        let (instrs, interner) = compile("DECLARE Nums : ARRAY[1:3] OF INTEGER\nDECLARE X : INTEGER\nX <- Nums[9]\n");
        let mut vm = Vm::new_batch(instrs, &interner, Vec::new());
        assert!(matches!(vm.run_batch(), Err(RuntimeError::IndexOutOfBounds { .. })));
    }

    #[test]
    fn input_past_end_of_queue_is_a_runtime_error() {
        let (instrs, interner) = compile("DECLARE X : INTEGER\nINPUT X\n");
        let mut vm = Vm::new_batch(instrs, &interner, Vec::new());
        assert_eq!(vm.run_batch(), Err(RuntimeError::InputExhausted));
    }

    #[test]
    fn reading_a_file_that_was_never_opened_is_a_runtime_error() {
        let (instrs, interner) = compile("DECLARE X : STRING\nREADFILE \"Missing.txt\", X\n");
        let mut vm = Vm::new_batch(instrs, &interner, Vec::new());
        assert_eq!(vm.run_batch(), Err(RuntimeError::FileNotOpen("Missing.txt".to_string())));
    }

    #[test]
    fn driver_mode_suspends_at_input_and_resumes_with_the_supplied_value() {
        let (instrs, interner) = compile("DECLARE X : INTEGER\nINPUT X\nOUTPUT X\n");
        let mut vm = Vm::new_interactive(instrs, &interner);
        match vm.run_driver(1_000).unwrap() {
            DriverOutcome::NeedsInput => {}
            other => panic!("expected NeedsInput, got {other:?}"),
        }
        vm.resume_input("42").unwrap();
        match vm.run_driver(1_000).unwrap() {
            DriverOutcome::Finished => {}
            other => panic!("expected Finished, got {other:?}"),
        }
        assert_eq!(vm.output().to_vec(), ["42"]);
    }

    #[test]
    fn cancel_stops_execution_on_the_next_step() {
        let (instrs, interner) = compile("DECLARE X : INTEGER\nINPUT X\nOUTPUT X\n");
        let mut vm = Vm::new_interactive(instrs, &interner);
        vm.cancel();
        assert_eq!(vm.run_driver(1_000), Err(RuntimeError::Cancelled));
    }
}
