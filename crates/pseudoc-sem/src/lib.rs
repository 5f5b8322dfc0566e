//! Semantic analysis: scope/type/arity checking over the AST (`spec.md`
//! §4.3). Two passes: pass one registers `TYPE`/`PROCEDURE`/`FUNCTION`
//! signatures so forward references within the program are legal; pass
//! two walks every statement checking declarations, assignments,
//! use-before-assignment, control-flow conditions, and call arity.
//!
//! This stage never mutates the AST — it is a pure check, consistent
//! with `spec.md` §2's "semantic check, no mutation" data-flow rule —
//! and, like the lexer and parser, stops at its first error rather than
//! collecting a batch of diagnostics (`spec.md` §7).

mod scope;

pub use scope::SymbolEntry;

use pseudoc_par::{BinOp, DataType, Expr, Param, Program, Stmt, TypeField, UnOp};
use pseudoc_util::{Handler, Interner, Span, Stage, Symbol};
use rustc_hash::FxHashMap;
use scope::SymbolTable;

/// `(arity, return type)` for every built-in `spec.md` §4.6 names.
fn builtin_signature(name: &str) -> Option<(usize, DataType)> {
    use DataType::*;
    Some(match name {
        "LENGTH" => (1, Integer),
        "UCASE" | "LCASE" | "TO_UPPER" | "TO_LOWER" => (1, String),
        "MID" => (3, String),
        "LEFT" | "RIGHT" => (2, String),
        "INT" => (1, Integer),
        "RAND" => (1, Integer),
        "NUM_TO_STR" => (1, String),
        "STR_TO_NUM" => (1, Real),
        "CHR" => (1, Char),
        "ASC" => (1, Integer),
        "EOF" => (1, Boolean),
        _ => return None,
    })
}

fn is_numeric(ty: DataType) -> bool {
    matches!(ty, DataType::Integer | DataType::Real)
}

fn is_string_like(ty: DataType) -> bool {
    matches!(ty, DataType::String | DataType::Char)
}

/// Assignment compatibility: row `target` <- column `value`, `spec.md`
/// §4.3's matrix (`REAL <- INTEGER` and `STRING <- CHAR` are the only
/// widenings; everything else must match exactly, and user record types
/// must match by name).
fn is_assignable(target: DataType, value: DataType) -> bool {
    use DataType::*;
    match (target, value) {
        (Integer, Integer) => true,
        (Real, Integer) | (Real, Real) => true,
        (String, String) | (String, Char) => true,
        (Char, Char) => true,
        (Boolean, Boolean) => true,
        (User(a), User(b)) => a == b,
        _ => false,
    }
}

/// `CASE` branch-value compatibility: numeric values compare against a
/// numeric selector regardless of INTEGER/REAL, everything else must
/// match the selector's type exactly (`spec.md` §4.3).
fn is_case_compatible(selector: DataType, value: DataType) -> bool {
    (is_numeric(selector) && is_numeric(value)) || selector == value
}

struct Analyzer<'a> {
    interner: &'a Interner,
    handler: &'a mut Handler,
    records: FxHashMap<Symbol, Vec<TypeField>>,
    procedures: FxHashMap<Symbol, Vec<Param>>,
    functions: FxHashMap<Symbol, (Vec<Param>, DataType)>,
    scopes: SymbolTable,
}

impl<'a> Analyzer<'a> {
    fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.handler.error(Stage::Sema, message, span);
    }

    fn type_known(&self, ty: DataType) -> bool {
        match ty {
            DataType::User(name) => self.records.contains_key(&name),
            _ => true,
        }
    }

    fn type_name(&self, ty: DataType) -> String {
        match ty {
            DataType::Integer => "INTEGER".to_string(),
            DataType::Real => "REAL".to_string(),
            DataType::String => "STRING".to_string(),
            DataType::Boolean => "BOOLEAN".to_string(),
            DataType::Char => "CHAR".to_string(),
            DataType::User(sym) => self.name(sym).to_string(),
        }
    }

    fn register_signatures(&mut self, program: &Program) {
        for stmt in program {
            match stmt {
                Stmt::TypeDef { name, fields, .. } => {
                    self.records.insert(*name, fields.clone());
                }
                Stmt::Procedure { name, params, .. } => {
                    self.procedures.insert(*name, params.clone());
                }
                Stmt::Function { name, params, returns, .. } => {
                    self.functions.insert(*name, (params.clone(), *returns));
                }
                _ => {}
            }
        }
    }

    fn check_program(&mut self, program: &Program) {
        self.register_signatures(program);
        for stmt in program {
            if self.handler.has_error() {
                return;
            }
            self.check_stmt(stmt);
        }
    }

    fn check_block(&mut self, block: &[Stmt]) {
        for stmt in block {
            if self.handler.has_error() {
                return;
            }
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declare { name, data_type, array_dims, span } => {
                if self.scopes.declared_in_current_scope(*name) {
                    self.error(format!("'{}' is already declared in this scope", self.name(*name)), *span);
                    return;
                }
                if !self.type_known(*data_type) {
                    self.error(format!("unknown type '{}'", self.type_name(*data_type)), *span);
                    return;
                }
                if let Some(dims) = array_dims {
                    for dim in dims {
                        if dim.start > dim.end {
                            self.error(
                                format!("array bounds [{}:{}] are out of order", dim.start, dim.end),
                                *span,
                            );
                            return;
                        }
                    }
                }
                self.scopes.declare(
                    *name,
                    SymbolEntry {
                        ty: *data_type,
                        assigned: false,
                        is_array: array_dims.is_some(),
                        dimensions: array_dims.clone(),
                        is_constant: false,
                    },
                );
            }
            Stmt::Constant { name, value, span } => {
                if self.scopes.declared_in_current_scope(*name) {
                    self.error(format!("'{}' is already declared in this scope", self.name(*name)), *span);
                    return;
                }
                let ty = match value {
                    Expr::IntegerLiteral(..) => DataType::Integer,
                    Expr::RealLiteral(..) => DataType::Real,
                    Expr::StringLiteral(..) => DataType::String,
                    Expr::BooleanLiteral(..) => DataType::Boolean,
                    _ => DataType::Integer,
                };
                self.scopes.declare(
                    *name,
                    SymbolEntry { ty, assigned: true, is_array: false, dimensions: None, is_constant: true },
                );
            }
            Stmt::TypeDef { fields, span, .. } => {
                for field in fields {
                    if !self.type_known(field.ty) {
                        self.error(format!("unknown type '{}'", self.type_name(field.ty)), *span);
                        return;
                    }
                }
            }
            Stmt::Assignment { name, indices, field, expr, span } => {
                let Some(entry) = self.scopes.lookup(*name).cloned() else {
                    self.error(format!("'{}' is not declared", self.name(*name)), *span);
                    self.check_expr(expr);
                    return;
                };
                if entry.is_constant {
                    self.error(format!("cannot assign to constant '{}'", self.name(*name)), *span);
                    return;
                }
                let target_ty = if let Some(idx_exprs) = indices {
                    if !entry.is_array {
                        self.error(format!("'{}' is not an array", self.name(*name)), *span);
                        return;
                    }
                    let rank = entry.dimensions.as_ref().map(|d| d.len()).unwrap_or(0);
                    if idx_exprs.len() != rank {
                        self.error(
                            format!(
                                "'{}' has {} dimension(s), found {} index(es)",
                                self.name(*name),
                                rank,
                                idx_exprs.len()
                            ),
                            *span,
                        );
                        return;
                    }
                    for idx in idx_exprs {
                        let idx_ty = self.check_expr(idx);
                        if idx_ty != DataType::Integer {
                            self.error("array index must be INTEGER", idx.span());
                        }
                    }
                    entry.ty
                } else if let Some(field_name) = field {
                    let DataType::User(record_name) = entry.ty else {
                        self.error(format!("'{}' is not a record", self.name(*name)), *span);
                        return;
                    };
                    match self.records.get(&record_name).and_then(|fs| fs.iter().find(|f| f.name == *field_name)) {
                        Some(f) => f.ty,
                        None => {
                            self.error(
                                format!("type '{}' has no field '{}'", self.name(record_name), self.name(*field_name)),
                                *span,
                            );
                            return;
                        }
                    }
                } else {
                    if entry.is_array {
                        self.error(format!("'{}' is an array; assign to an element instead", self.name(*name)), *span);
                        return;
                    }
                    entry.ty
                };
                let expr_ty = self.check_expr(expr);
                if !is_assignable(target_ty, expr_ty) {
                    self.error(
                        format!(
                            "cannot assign {} to variable of type {}",
                            self.type_name(expr_ty),
                            self.type_name(target_ty)
                        ),
                        *span,
                    );
                    return;
                }
                self.scopes.mark_assigned(*name);
            }
            Stmt::Output { values, .. } => {
                for v in values {
                    self.check_expr(v);
                }
            }
            Stmt::Input { name, indices, field, span } => {
                let Some(entry) = self.scopes.lookup(*name).cloned() else {
                    self.error(format!("'{}' is not declared", self.name(*name)), *span);
                    return;
                };
                if entry.is_constant {
                    self.error(format!("cannot INPUT into constant '{}'", self.name(*name)), *span);
                    return;
                }
                if let Some(idx_exprs) = indices {
                    if !entry.is_array {
                        self.error(format!("'{}' is not an array", self.name(*name)), *span);
                        return;
                    }
                    for idx in idx_exprs {
                        let idx_ty = self.check_expr(idx);
                        if idx_ty != DataType::Integer {
                            self.error("array index must be INTEGER", idx.span());
                        }
                    }
                } else if let Some(field_name) = field {
                    if let DataType::User(record_name) = entry.ty {
                        if self.records.get(&record_name).map_or(true, |fs| !fs.iter().any(|f| f.name == *field_name)) {
                            self.error(
                                format!("type '{}' has no field '{}'", self.name(record_name), self.name(*field_name)),
                                *span,
                            );
                            return;
                        }
                    } else {
                        self.error(format!("'{}' is not a record", self.name(*name)), *span);
                        return;
                    }
                }
                self.scopes.mark_assigned(*name);
            }
            Stmt::If { cond, then_branch, else_branch, span } => {
                let cond_ty = self.check_expr(cond);
                if cond_ty != DataType::Boolean {
                    self.error("IF condition must be BOOLEAN", *span);
                }
                self.check_block(then_branch);
                if let Some(else_block) = else_branch {
                    self.check_block(else_block);
                }
            }
            Stmt::While { cond, body, span } => {
                let cond_ty = self.check_expr(cond);
                if cond_ty != DataType::Boolean {
                    self.error("WHILE condition must be BOOLEAN", *span);
                }
                self.check_block(body);
            }
            Stmt::Repeat { body, cond, span } => {
                self.check_block(body);
                let cond_ty = self.check_expr(cond);
                if cond_ty != DataType::Boolean {
                    self.error("REPEAT UNTIL condition must be BOOLEAN", *span);
                }
            }
            Stmt::For { loop_var, start, end, step, body, span } => {
                match self.scopes.lookup(*loop_var).cloned() {
                    Some(entry) if entry.ty == DataType::Integer => {}
                    Some(_) => self.error(format!("FOR loop variable '{}' must be INTEGER", self.name(*loop_var)), *span),
                    None => self.error(format!("'{}' is not declared", self.name(*loop_var)), *span),
                }
                self.scopes.mark_assigned(*loop_var);
                let start_ty = self.check_expr(start);
                if start_ty != DataType::Integer {
                    self.error("FOR start expression must be INTEGER", start.span());
                }
                let end_ty = self.check_expr(end);
                if end_ty != DataType::Integer {
                    self.error("FOR end expression must be INTEGER", end.span());
                }
                if let Some(step_expr) = step {
                    let step_ty = self.check_expr(step_expr);
                    if step_ty != DataType::Integer {
                        self.error("FOR step expression must be INTEGER", step_expr.span());
                    }
                }
                self.check_block(body);
            }
            Stmt::Case { expr, branches, otherwise, span: _ } => {
                let selector_ty = self.check_expr(expr);
                for branch in branches {
                    for value in &branch.values {
                        let value_ty = self.check_expr(value);
                        if !is_case_compatible(selector_ty, value_ty) {
                            self.error(
                                format!(
                                    "CASE branch value of type {} is not compatible with selector type {}",
                                    self.type_name(value_ty),
                                    self.type_name(selector_ty)
                                ),
                                value.span(),
                            );
                        }
                    }
                    self.check_block(&branch.body);
                }
                if let Some(body) = otherwise {
                    self.check_block(body);
                }
            }
            Stmt::Procedure { params, body, .. } => {
                self.scopes.enter_scope();
                self.declare_params(params);
                self.check_block(body);
                self.scopes.exit_scope();
            }
            Stmt::Function { params, returns, body, span } => {
                if !self.type_known(*returns) {
                    self.error(format!("unknown return type '{}'", self.type_name(*returns)), *span);
                    return;
                }
                self.scopes.enter_scope();
                self.declare_params(params);
                self.check_block(body);
                self.scopes.exit_scope();
            }
            Stmt::Call { name, args, span } => {
                let arity = if let Some(params) = self.procedures.get(name) {
                    Some(params.len())
                } else if let Some((params, _)) = self.functions.get(name) {
                    Some(params.len())
                } else if let Some((n, _)) = builtin_signature(self.name(*name)) {
                    Some(n)
                } else {
                    None
                };
                match arity {
                    Some(n) if n != args.len() => {
                        self.error(
                            format!("'{}' expects {} argument(s), found {}", self.name(*name), n, args.len()),
                            *span,
                        );
                    }
                    None => {
                        self.error(format!("call to undefined procedure or function '{}'", self.name(*name)), *span);
                    }
                    _ => {}
                }
                for arg in args {
                    self.check_expr(arg);
                }
            }
            Stmt::Return { value, .. } => {
                // RETURN's payload type is intentionally not compared
                // against the enclosing FUNCTION's declared RETURNS type
                // (spec.md §9 open question); only walked for
                // use-before-assignment checking.
                if let Some(expr) = value {
                    self.check_expr(expr);
                }
            }
            Stmt::OpenFile { name, .. } => {
                self.check_expr(name);
            }
            Stmt::ReadFile { name, target, span } => {
                self.check_expr(name);
                if !self.scopes.mark_assigned(*target) {
                    self.error(format!("'{}' is not declared", self.name(*target)), *span);
                }
            }
            Stmt::WriteFile { name, data, .. } => {
                self.check_expr(name);
                self.check_expr(data);
            }
            Stmt::CloseFile { name, .. } => {
                self.check_expr(name);
            }
        }
    }

    fn declare_params(&mut self, params: &[Param]) {
        for param in params {
            if self.scopes.declared_in_current_scope(param.name) {
                self.error(format!("duplicate parameter '{}'", self.name(param.name)), param.span);
                continue;
            }
            self.scopes.declare(
                param.name,
                SymbolEntry { ty: param.ty, assigned: true, is_array: false, dimensions: None, is_constant: false },
            );
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> DataType {
        match expr {
            Expr::IntegerLiteral(..) => DataType::Integer,
            Expr::RealLiteral(..) => DataType::Real,
            Expr::StringLiteral(..) => DataType::String,
            Expr::BooleanLiteral(..) => DataType::Boolean,
            Expr::Identifier(name, span) => {
                let Some(entry) = self.scopes.lookup(*name).cloned() else {
                    self.error(format!("'{}' is not declared", self.name(*name)), *span);
                    return DataType::Integer;
                };
                if !entry.assigned {
                    self.error(format!("variable '{}' used before assignment", self.name(*name)), *span);
                }
                entry.ty
            }
            Expr::ArrayAccess { name, indices, span } => {
                let Some(entry) = self.scopes.lookup(*name).cloned() else {
                    self.error(format!("'{}' is not declared", self.name(*name)), *span);
                    return DataType::Integer;
                };
                if !entry.is_array {
                    self.error(format!("'{}' is not an array", self.name(*name)), *span);
                    return entry.ty;
                }
                let rank = entry.dimensions.as_ref().map(|d| d.len()).unwrap_or(0);
                if indices.len() != rank {
                    self.error(
                        format!("'{}' has {} dimension(s), found {} index(es)", self.name(*name), rank, indices.len()),
                        *span,
                    );
                }
                for idx in indices {
                    let idx_ty = self.check_expr(idx);
                    if idx_ty != DataType::Integer {
                        self.error("array index must be INTEGER", idx.span());
                    }
                }
                entry.ty
            }
            Expr::FieldAccess { object, field, span } => {
                let object_ty = self.check_expr(object);
                let DataType::User(record_name) = object_ty else {
                    self.error("field access on a non-record value", *span);
                    return DataType::Integer;
                };
                match self.records.get(&record_name).and_then(|fs| fs.iter().find(|f| f.name == *field)) {
                    Some(f) => f.ty,
                    None => {
                        self.error(
                            format!("type '{}' has no field '{}'", self.name(record_name), self.name(*field)),
                            *span,
                        );
                        DataType::Integer
                    }
                }
            }
            Expr::Binary { left, op, right, span } => {
                let lty = self.check_expr(left);
                let rty = self.check_expr(right);
                self.check_binary(*op, lty, rty, *span)
            }
            Expr::Unary { op, expr, span } => {
                let ety = self.check_expr(expr);
                match op {
                    UnOp::Negate => {
                        if !is_numeric(ety) {
                            self.error("unary '-' requires a numeric operand", *span);
                        }
                        ety
                    }
                    UnOp::Not => {
                        if ety != DataType::Boolean {
                            self.error("NOT requires a BOOLEAN operand", *span);
                        }
                        DataType::Boolean
                    }
                }
            }
            Expr::Call { name, args, span } => {
                let signature = if let Some((params, returns)) = self.functions.get(name) {
                    Some((params.len(), *returns))
                } else {
                    builtin_signature(self.name(*name))
                };
                match signature {
                    Some((arity, returns)) => {
                        if arity != args.len() {
                            self.error(
                                format!("'{}' expects {} argument(s), found {}", self.name(*name), arity, args.len()),
                                *span,
                            );
                        }
                        for arg in args {
                            self.check_expr(arg);
                        }
                        returns
                    }
                    None => {
                        self.error(format!("call to undefined function '{}'", self.name(*name)), *span);
                        for arg in args {
                            self.check_expr(arg);
                        }
                        DataType::Integer
                    }
                }
            }
        }
    }

    /// Binary operator typing, `spec.md` §4.3: `/` is always REAL, `DIV`
    /// and `MOD` are always INTEGER, the other arithmetic ops widen to
    /// REAL if either side is REAL, `&` needs a STRING/CHAR operand and
    /// yields STRING, comparisons need two numerics, two string-likes, or
    /// two booleans, and `AND`/`OR` need two booleans.
    fn check_binary(&mut self, op: BinOp, lty: DataType, rty: DataType, span: Span) -> DataType {
        use BinOp::*;
        match op {
            Add | Sub | Mul | Pow => {
                if !is_numeric(lty) || !is_numeric(rty) {
                    self.error("arithmetic operator requires numeric operands", span);
                }
                if lty == DataType::Real || rty == DataType::Real {
                    DataType::Real
                } else {
                    DataType::Integer
                }
            }
            Div => {
                if !is_numeric(lty) || !is_numeric(rty) {
                    self.error("'/' requires numeric operands", span);
                }
                DataType::Real
            }
            IntDiv | IntMod => {
                if !is_numeric(lty) || !is_numeric(rty) {
                    self.error("DIV/MOD require numeric operands", span);
                }
                DataType::Integer
            }
            Concat => {
                if !is_string_like(lty) && !is_string_like(rty) {
                    self.error("'&' requires a STRING or CHAR operand", span);
                }
                DataType::String
            }
            Eq | Ne | Lt | Gt | Le | Ge => {
                let ok = (is_numeric(lty) && is_numeric(rty))
                    || (is_string_like(lty) && is_string_like(rty))
                    || (lty == DataType::Boolean && rty == DataType::Boolean);
                if !ok {
                    self.error("comparison operands must both be numeric, string-like, or BOOLEAN", span);
                }
                DataType::Boolean
            }
            And | Or => {
                if lty != DataType::Boolean || rty != DataType::Boolean {
                    self.error("AND/OR require BOOLEAN operands", span);
                }
                DataType::Boolean
            }
        }
    }
}

/// Runs both passes over `program`, reporting through `handler`. Returns
/// `true` if no semantic error was raised.
pub fn analyze(program: &Program, interner: &Interner, handler: &mut Handler) -> bool {
    let mut analyzer = Analyzer {
        interner,
        handler,
        records: FxHashMap::default(),
        procedures: FxHashMap::default(),
        functions: FxHashMap::default(),
        scopes: SymbolTable::new(),
    };
    analyzer.check_program(program);
    !analyzer.handler.has_error()
}
