//! AST to IR lowering (`spec.md` §4.4).
//!
//! Runs only after `pseudoc-sem` has accepted the program — this stage
//! never reports a diagnostic of its own, matching `spec.md` §2's
//! one-way data flow ("no component reads from a later one" and the
//! semantic check never mutates what IR generation reads).

use crate::instr::{FileMode as IrFileMode, Instr, Label, Operand, Place, TempId};
use pseudoc_par::{BinOp, CaseBranch, Expr, FileMode, Param, ParamMode, Program, Stmt, UnOp};
use pseudoc_util::{Interner, Symbol};
use rustc_hash::{FxHashMap, FxHashSet};

/// `spec.md` §4.6's fixed built-in vocabulary — anything else in call
/// position is a user procedure or function.
const BUILTIN_NAMES: &[&str] = &[
    "LENGTH", "UCASE", "LCASE", "TO_UPPER", "TO_LOWER", "MID", "LEFT", "RIGHT", "INT", "RAND",
    "NUM_TO_STR", "STR_TO_NUM", "CHR", "ASC", "EOF",
];

fn builtin_name(upper: &str) -> Option<&'static str> {
    BUILTIN_NAMES.iter().find(|&&b| b == upper).copied()
}

struct Generator<'a> {
    interner: &'a Interner,
    instrs: Vec<Instr>,
    next_temp: TempId,
    next_label: u32,
    constants: FxHashMap<Symbol, Operand>,
    procedures: FxHashSet<Symbol>,
    functions: FxHashSet<Symbol>,
    /// BYREF parameter names of the routine currently being lowered —
    /// consulted by every `RETURN` (and the routine's own fallthrough
    /// tail) to emit `WRITEBACK_BYREF` (`spec.md` §4.4 epilogue).
    current_byref: Vec<Symbol>,
    /// Depth of routine bodies currently being lowered — zero at the
    /// top level, where a bare `DECLARE` needs no `LOCAL` marker.
    routine_depth: u32,
}

impl<'a> Generator<'a> {
    fn new(interner: &'a Interner) -> Self {
        Self {
            interner,
            instrs: Vec::new(),
            next_temp: 0,
            next_label: 0,
            constants: FxHashMap::default(),
            procedures: FxHashSet::default(),
            functions: FxHashSet::default(),
            current_byref: Vec::new(),
            routine_depth: 0,
        }
    }

    fn emit(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    fn new_temp(&mut self) -> TempId {
        let t = self.next_temp;
        self.next_temp += 1;
        t
    }

    fn new_label(&mut self) -> Label {
        let l = self.next_label;
        self.next_label += 1;
        Label::Numbered(l)
    }

    fn register_routines(&mut self, program: &Program) {
        for stmt in program {
            match stmt {
                Stmt::Procedure { name, .. } => {
                    self.procedures.insert(*name);
                }
                Stmt::Function { name, .. } => {
                    self.functions.insert(*name);
                }
                _ => {}
            }
        }
    }

    fn lower_block(&mut self, block: &[Stmt]) {
        for stmt in block {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declare { name, array_dims, .. } => {
                if let Some(dims) = array_dims {
                    self.emit(Instr::Array { name: *name, dims: dims.clone() });
                } else if self.in_routine() {
                    self.emit(Instr::Local { name: *name });
                }
            }
            Stmt::Constant { name, value, .. } => {
                let operand = match value {
                    Expr::IntegerLiteral(n, _) => Operand::Int(*n),
                    Expr::RealLiteral(n, _) => Operand::Real(*n),
                    Expr::StringLiteral(s, _) => Operand::Str(*s),
                    Expr::BooleanLiteral(b, _) => Operand::Bool(*b),
                    _ => unreachable!("parser only accepts literal CONSTANT values"),
                };
                self.constants.insert(*name, operand);
            }
            Stmt::TypeDef { .. } => {}
            Stmt::Assignment { name, indices, field, expr, .. } => {
                let value = self.lower_expr(expr);
                let place = self.lower_target(*name, indices.as_deref(), *field);
                self.emit(Instr::Store { place, value });
            }
            Stmt::Output { values, .. } => {
                if values.len() == 1 {
                    let v = self.lower_expr(&values[0]);
                    self.emit(Instr::Output { value: v });
                } else {
                    for v in values {
                        let value = self.lower_expr(v);
                        self.emit(Instr::OutputPart { value });
                    }
                    self.emit(Instr::OutputEnd);
                }
            }
            Stmt::Input { name, indices, field, .. } => {
                let target = self.lower_target(*name, indices.as_deref(), *field);
                self.emit(Instr::Input { target });
            }
            Stmt::If { cond, then_branch, else_branch, .. } => self.lower_if(cond, then_branch, else_branch.as_deref()),
            Stmt::While { cond, body, .. } => self.lower_while(cond, body),
            Stmt::Repeat { body, cond, .. } => self.lower_repeat(body, cond),
            Stmt::For { loop_var, start, end, step, body, .. } => self.lower_for(*loop_var, start, end, step.as_ref(), body),
            Stmt::Case { expr, branches, otherwise, .. } => self.lower_case(expr, branches, otherwise.as_deref()),
            Stmt::Procedure { name, params, body, .. } => self.lower_routine(Label::Proc(*name), params, body),
            Stmt::Function { name, params, body, .. } => self.lower_routine(Label::Func(*name), params, body),
            Stmt::Call { name, args, .. } => {
                self.lower_call_args(args);
                self.emit(Instr::Call { label: Label::Proc(*name) });
            }
            Stmt::Return { value, .. } => {
                if let Some(e) = value {
                    let v = self.lower_expr(e);
                    self.emit(Instr::SetRetVal { value: v });
                }
                self.emit_epilogue();
                self.emit(Instr::Ret);
            }
            Stmt::OpenFile { name, mode, .. } => {
                let n = self.lower_expr(name);
                self.emit(Instr::OpenFile { name: n, mode: lower_file_mode(*mode) });
            }
            Stmt::ReadFile { name, target, .. } => {
                let n = self.lower_expr(name);
                self.emit(Instr::ReadFile { name: n, target: Place::Var(*target) });
            }
            Stmt::WriteFile { name, data, .. } => {
                let n = self.lower_expr(name);
                let d = self.lower_expr(data);
                self.emit(Instr::WriteFile { name: n, value: d });
            }
            Stmt::CloseFile { name, .. } => {
                let n = self.lower_expr(name);
                self.emit(Instr::CloseFile { name: n });
            }
        }
    }

    fn in_routine(&self) -> bool {
        // `current_byref` is always populated (possibly empty) exactly
        // while lowering a routine body; an empty-but-active routine
        // without BYREF params is tracked by `routine_depth` below.
        self.routine_depth > 0
    }

    fn lower_target(&mut self, name: Symbol, indices: Option<&[Expr]>, field: Option<Symbol>) -> Place {
        if let Some(idx_exprs) = indices {
            let indices = idx_exprs.iter().map(|e| self.lower_expr(e)).collect();
            Place::Index { name, indices }
        } else if let Some(field) = field {
            Place::Field { name, field }
        } else {
            Place::Var(name)
        }
    }

    fn lower_if(&mut self, cond: &Expr, then_branch: &[Stmt], else_branch: Option<&[Stmt]>) {
        let cond_val = self.lower_expr(cond);
        let l_end = self.new_label();
        if let Some(else_block) = else_branch {
            let l_else = self.new_label();
            self.emit(Instr::IfZero { value: cond_val, label: l_else });
            self.lower_block(then_branch);
            self.emit(Instr::Goto { label: l_end });
            self.emit(Instr::Label(l_else));
            self.lower_block(else_block);
            self.emit(Instr::Label(l_end));
        } else {
            self.emit(Instr::IfZero { value: cond_val, label: l_end });
            self.lower_block(then_branch);
            self.emit(Instr::Label(l_end));
        }
    }

    fn lower_while(&mut self, cond: &Expr, body: &[Stmt]) {
        let l_start = self.new_label();
        let l_end = self.new_label();
        self.emit(Instr::Label(l_start));
        let cond_val = self.lower_expr(cond);
        self.emit(Instr::IfZero { value: cond_val, label: l_end });
        self.lower_block(body);
        self.emit(Instr::Goto { label: l_start });
        self.emit(Instr::Label(l_end));
    }

    fn lower_repeat(&mut self, body: &[Stmt], cond: &Expr) {
        let l_start = self.new_label();
        self.emit(Instr::Label(l_start));
        self.lower_block(body);
        let cond_val = self.lower_expr(cond);
        self.emit(Instr::IfZero { value: cond_val, label: l_start });
    }

    /// Direction-aware `FOR` lowering, `spec.md` §4.4: a literal step
    /// picks the comparison direction at compile time; anything else
    /// computes the direction at runtime.
    fn lower_for(&mut self, loop_var: Symbol, start: &Expr, end: &Expr, step: Option<&Expr>, body: &[Stmt]) {
        let start_val = self.lower_expr(start);
        self.emit(Instr::Store { place: Place::Var(loop_var), value: start_val });
        let l_start = self.new_label();
        let l_end = self.new_label();
        self.emit(Instr::Label(l_start));

        let literal_step = step.and_then(|e| e.as_signed_integer_literal());
        match (step, literal_step) {
            (None, _) | (Some(_), Some(_)) => {
                let n = literal_step.unwrap_or(1);
                let end_val = self.lower_expr(end);
                let op = if n >= 0 { BinOp::Le } else { BinOp::Ge };
                let cond = self.new_temp();
                self.emit(Instr::BinaryOp { dst: cond, op, lhs: Operand::Var(loop_var), rhs: end_val });
                self.emit(Instr::IfZero { value: Operand::Temp(cond), label: l_end });
            }
            (Some(step_expr), None) => {
                let step_val = self.lower_expr(step_expr);
                let end_val = self.lower_expr(end);
                let step_pos = self.new_temp();
                self.emit(Instr::BinaryOp { dst: step_pos, op: BinOp::Gt, lhs: step_val.clone(), rhs: Operand::Int(0) });
                let up = self.new_temp();
                self.emit(Instr::BinaryOp { dst: up, op: BinOp::Le, lhs: Operand::Var(loop_var), rhs: end_val.clone() });
                let down = self.new_temp();
                self.emit(Instr::BinaryOp { dst: down, op: BinOp::Ge, lhs: Operand::Var(loop_var), rhs: end_val });
                let not_pos = self.new_temp();
                self.emit(Instr::BinaryOp { dst: not_pos, op: BinOp::Eq, lhs: Operand::Temp(step_pos), rhs: Operand::Int(0) });
                let and_up = self.new_temp();
                self.emit(Instr::BinaryOp { dst: and_up, op: BinOp::And, lhs: Operand::Temp(step_pos), rhs: Operand::Temp(up) });
                let and_down = self.new_temp();
                self.emit(Instr::BinaryOp { dst: and_down, op: BinOp::And, lhs: Operand::Temp(not_pos), rhs: Operand::Temp(down) });
                let cond = self.new_temp();
                self.emit(Instr::BinaryOp { dst: cond, op: BinOp::Or, lhs: Operand::Temp(and_up), rhs: Operand::Temp(and_down) });
                self.emit(Instr::IfZero { value: Operand::Temp(cond), label: l_end });
            }
        }

        self.lower_block(body);
        let step_val = match step {
            Some(e) => self.lower_expr(e),
            None => Operand::Int(1),
        };
        let sum = self.new_temp();
        self.emit(Instr::BinaryOp { dst: sum, op: BinOp::Add, lhs: Operand::Var(loop_var), rhs: step_val });
        self.emit(Instr::Store { place: Place::Var(loop_var), value: Operand::Temp(sum) });
        self.emit(Instr::Goto { label: l_start });
        self.emit(Instr::Label(l_end));
    }

    /// `spec.md` §4.4: single-value branches compare with `IFZ`;
    /// multi-value branches `IFNZ` into a shared match label.
    fn lower_case(&mut self, expr: &Expr, branches: &[CaseBranch], otherwise: Option<&[Stmt]>) {
        let sel_val = self.lower_expr(expr);
        let l_end = self.new_label();
        for branch in branches {
            let l_next = self.new_label();
            if branch.values.len() == 1 {
                let val = self.lower_expr(&branch.values[0]);
                let t = self.new_temp();
                self.emit(Instr::BinaryOp { dst: t, op: BinOp::Eq, lhs: sel_val.clone(), rhs: val });
                self.emit(Instr::IfZero { value: Operand::Temp(t), label: l_next });
            } else {
                let l_match = self.new_label();
                for v in &branch.values {
                    let val = self.lower_expr(v);
                    let t = self.new_temp();
                    self.emit(Instr::BinaryOp { dst: t, op: BinOp::Eq, lhs: sel_val.clone(), rhs: val });
                    self.emit(Instr::IfNonZero { value: Operand::Temp(t), label: l_match });
                }
                self.emit(Instr::Goto { label: l_next });
                self.emit(Instr::Label(l_match));
            }
            self.lower_block(&branch.body);
            self.emit(Instr::Goto { label: l_end });
            self.emit(Instr::Label(l_next));
        }
        if let Some(body) = otherwise {
            self.lower_block(body);
        }
        self.emit(Instr::Label(l_end));
    }

    /// Wraps the body in `GOTO Lskip … PROC_<name>:/FUNC_<name>: … Lskip:`
    /// so a program falling through the top level never steps into a
    /// procedure/function definition (`spec.md` §4.4).
    fn lower_routine(&mut self, entry: Label, params: &[Param], body: &[Stmt]) {
        let l_skip = self.new_label();
        self.emit(Instr::Goto { label: l_skip });
        self.emit(Instr::Label(entry));
        self.emit(Instr::EnterScope);
        for param in params.iter().rev() {
            match param.mode {
                ParamMode::ByRef => self.emit(Instr::PopByRef { name: param.name }),
                ParamMode::ByVal => self.emit(Instr::PopParam { name: param.name }),
            }
        }

        let saved_byref = std::mem::replace(
            &mut self.current_byref,
            params.iter().filter(|p| p.mode == ParamMode::ByRef).map(|p| p.name).collect(),
        );
        self.routine_depth += 1;
        self.lower_block(body);
        self.routine_depth -= 1;
        self.current_byref = saved_byref;

        if !matches!(body.last(), Some(Stmt::Return { .. })) {
            self.emit_tail_epilogue(params);
            self.emit(Instr::Ret);
        }
        self.emit(Instr::Label(l_skip));
    }

    fn emit_tail_epilogue(&mut self, params: &[Param]) {
        for param in params.iter().filter(|p| p.mode == ParamMode::ByRef) {
            self.emit(Instr::WritebackByRef { name: param.name });
        }
        self.emit(Instr::ExitScope);
    }

    fn emit_epilogue(&mut self) {
        let byref = self.current_byref.clone();
        for name in byref {
            self.emit(Instr::WritebackByRef { name });
        }
        self.emit(Instr::ExitScope);
    }

    /// `spec.md` §4.4: an identifier or array-element argument is passed
    /// through `PUSH`+`PUSH_REF` so the callee can write it back if its
    /// parameter is `BYREF`; any other expression only pushes a value.
    fn lower_call_args(&mut self, args: &[Expr]) {
        for arg in args {
            match arg {
                Expr::Identifier(name, _) => {
                    self.emit(Instr::Push { value: Operand::Var(*name) });
                    self.emit(Instr::PushRef { target: Some(Place::Var(*name)) });
                }
                Expr::ArrayAccess { name, indices, .. } => {
                    let idx_ops: Vec<Operand> = indices.iter().map(|e| self.lower_expr(e)).collect();
                    self.emit(Instr::Push { value: Operand::Index { name: *name, indices: idx_ops.clone() } });
                    self.emit(Instr::PushRef { target: Some(Place::Index { name: *name, indices: idx_ops }) });
                }
                other => {
                    let v = self.lower_expr(other);
                    self.emit(Instr::Push { value: v });
                    self.emit(Instr::PushRef { target: None });
                }
            }
        }
    }

    fn lower_call_expr(&mut self, name: Symbol, args: &[Expr]) -> Operand {
        let upper = self.interner.resolve(name).to_ascii_uppercase();
        if let Some(builtin) = builtin_name(&upper) {
            let arg_ops: Vec<Operand> = args.iter().map(|a| self.lower_expr(a)).collect();
            let t = self.new_temp();
            self.emit(Instr::Builtin { dst: t, name: builtin, args: arg_ops });
            return Operand::Temp(t);
        }
        self.lower_call_args(args);
        let label = if self.functions.contains(&name) { Label::Func(name) } else { Label::Proc(name) };
        self.emit(Instr::Call { label });
        let t = self.new_temp();
        self.emit(Instr::AssignOperand { dst: t, src: Operand::RetVal });
        Operand::Temp(t)
    }

    fn lower_expr(&mut self, expr: &Expr) -> Operand {
        match expr {
            Expr::IntegerLiteral(n, _) => Operand::Int(*n),
            Expr::RealLiteral(n, _) => Operand::Real(*n),
            Expr::StringLiteral(s, _) => Operand::Str(*s),
            Expr::BooleanLiteral(b, _) => Operand::Bool(*b),
            Expr::Identifier(name, _) => {
                self.constants.get(name).cloned().unwrap_or(Operand::Var(*name))
            }
            Expr::ArrayAccess { name, indices, .. } => {
                let idx_ops = indices.iter().map(|e| self.lower_expr(e)).collect();
                Operand::Index { name: *name, indices: idx_ops }
            }
            Expr::FieldAccess { object, field, .. } => {
                let name = match object.as_ref() {
                    Expr::Identifier(name, _) => *name,
                    _ => unreachable!("the grammar only ever builds FieldAccess on a plain identifier"),
                };
                Operand::Field { name, field: *field }
            }
            Expr::Binary { left, op, right, .. } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let t = self.new_temp();
                self.emit(Instr::BinaryOp { dst: t, op: *op, lhs: l, rhs: r });
                Operand::Temp(t)
            }
            Expr::Unary { op, expr, .. } => {
                let v = self.lower_expr(expr);
                let t = self.new_temp();
                match op {
                    UnOp::Negate => self.emit(Instr::BinaryOp { dst: t, op: BinOp::Sub, lhs: Operand::Int(0), rhs: v }),
                    UnOp::Not => self.emit(Instr::BinaryOp { dst: t, op: BinOp::Eq, lhs: v, rhs: Operand::Int(0) }),
                }
                Operand::Temp(t)
            }
            Expr::Call { name, args, .. } => self.lower_call_expr(*name, args),
        }
    }
}

fn lower_file_mode(mode: FileMode) -> IrFileMode {
    match mode {
        FileMode::Read => IrFileMode::Read,
        FileMode::Write => IrFileMode::Write,
        FileMode::Append => IrFileMode::Append,
    }
}

/// Lowers a semantically-checked [`Program`] into a flat IR sequence
/// (`spec.md` §4.4).
pub fn generate(program: &Program, interner: &Interner) -> Vec<Instr> {
    let mut gen = Generator::new(interner);
    gen.register_routines(program);
    gen.lower_block(program);
    gen.instrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pseudoc_lex::Lexer;
    use pseudoc_util::Handler;

    fn lower(src: &str) -> (Vec<Instr>, Interner) {
        let mut interner = Interner::new();
        let mut handler = Handler::new();
        let tokens = Lexer::new(src, &mut interner, &mut handler).tokenize();
        let program = pseudoc_par::Parser::new(tokens, &interner, &mut handler)
            .parse()
            .expect("program should parse");
        let instrs = generate(&program, &interner);
        (instrs, interner)
    }

    #[test]
    fn arithmetic_folds_into_a_single_binary_op_chain() {
        let (instrs, interner) = lower("OUTPUT 1 + 2 * 3");
        let text = render_program(&instrs, &interner);
        assert!(text.contains("* 2, 3") || text.contains("2 * 3"));
        assert!(text.lines().any(|l| l.starts_with("OUTPUT")));
    }

    #[test]
    fn byref_call_pushes_a_writeback_target() {
        let (instrs, interner) = lower(
            "PROCEDURE Swap(BYREF A : INTEGER, BYREF B : INTEGER)\n\
               DECLARE Tmp : INTEGER\n\
               Tmp <- A\n\
               A <- B\n\
               B <- Tmp\n\
             ENDPROCEDURE\n\
             DECLARE X : INTEGER\n\
             DECLARE Y : INTEGER\n\
             X <- 1\n\
             Y <- 2\n\
             CALL Swap(X, Y)\n",
        );
        let text = render_program(&instrs, &interner);
        assert!(text.contains("PUSH_REF X"));
        assert!(text.contains("PUSH_REF Y"));
        assert!(text.contains("WRITEBACK_BYREF A"));
        assert!(text.contains("WRITEBACK_BYREF B"));
        assert!(text.contains("CALL PROC_Swap"));
    }

    #[test]
    fn for_loop_with_negative_step_uses_descending_comparison() {
        let (instrs, _) = lower("FOR I <- 10 TO 1 STEP -1\n  OUTPUT I\nNEXT I\n");
        assert!(instrs.iter().any(|i| matches!(i, Instr::BinaryOp { op: BinOp::Ge, .. })));
        assert!(!instrs.iter().any(|i| matches!(i, Instr::BinaryOp { op: BinOp::Le, .. })));
    }

    #[test]
    fn for_loop_with_dynamic_step_branches_on_sign_at_runtime() {
        let (instrs, _) = lower("DECLARE S : INTEGER\nS <- 1\nFOR I <- 1 TO 10 STEP S\n  OUTPUT I\nNEXT I\n");
        let has_up = instrs.iter().any(|i| matches!(i, Instr::BinaryOp { op: BinOp::Le, .. }));
        let has_down = instrs.iter().any(|i| matches!(i, Instr::BinaryOp { op: BinOp::Ge, .. }));
        assert!(has_up && has_down);
    }

    #[test]
    fn case_with_multiple_values_uses_ifnz_into_a_shared_label() {
        let (instrs, _) = lower(
            "DECLARE Grade : INTEGER\n\
             Grade <- 2\n\
             CASE OF Grade\n\
               1, 2: OUTPUT \"Pass\"\n\
               OTHERWISE: OUTPUT \"Fail\"\n\
             ENDCASE\n",
        );
        assert!(instrs.iter().any(|i| matches!(i, Instr::IfNonZero { .. })));
    }

    #[test]
    fn bubble_sort_body_produces_array_store_and_loop_structure() {
        let (instrs, interner) = lower(
            "DECLARE Nums : ARRAY[1:3] OF INTEGER\n\
             FOR I <- 1 TO 2\n\
               IF Nums[I] > Nums[I + 1]\n\
                 THEN\n\
                   DECLARE Tmp : INTEGER\n\
                   Tmp <- Nums[I]\n\
                   Nums[I] <- Nums[I + 1]\n\
                   Nums[I + 1] <- Tmp\n\
               ENDIF\n\
             NEXT I\n",
        );
        let text = render_program(&instrs, &interner);
        assert!(text.contains("ARRAY Nums [1:3]"));
        assert!(instrs.iter().any(|i| matches!(i, Instr::Store { place: Place::Index { .. }, .. })));
    }
}
