//! The IR instruction model (`spec.md` §3, §6).
//!
//! `spec.md` §9 flags the string-based IR of the system this is modelled
//! on as "convenient for debugging but fragile" and calls for "a
//! production rewrite [that] should lower to a structured instruction
//! variant while preserving a canonical textual dump for inspection."
//! `Instr` is that structured variant: one enum case per line-shape in
//! `spec.md` §6's grammar, carrying typed operands instead of raw text.
//! [`render_program`] renders the exact textual grammar back out, so a
//! host can still inspect/diff IR the way `spec.md` §6's `compile(...).ir`
//! promises, and golden-output tests can assert against it directly.

use pseudoc_par::{ArrayDim, BinOp};
use pseudoc_util::{Interner, Symbol};
use std::fmt;

pub type TempId = u32;

/// A jump target. Numbered labels (`L3`) are synthesised by the
/// generator; `Proc`/`Func` are the fixed entry-point names `spec.md`
/// §3 reserves for procedure/function bodies (`PROC_<name>`/`FUNC_<name>`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    Numbered(u32),
    Proc(Symbol),
    Func(Symbol),
}

impl Label {
    pub fn render(&self, interner: &Interner) -> String {
        match self {
            Label::Numbered(n) => format!("L{n}"),
            Label::Proc(name) => format!("PROC_{}", interner.resolve(*name)),
            Label::Func(name) => format!("FUNC_{}", interner.resolve(*name)),
        }
    }
}

/// A value an instruction reads: a literal, a plain variable, a
/// temporary, an array element, a record field, or the VM's return slot
/// (`spec.md` §6: "the literal RETVAL returns the last return value").
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Int(i64),
    Real(f64),
    Str(Symbol),
    Bool(bool),
    Var(Symbol),
    Temp(TempId),
    Index { name: Symbol, indices: Vec<Operand> },
    Field { name: Symbol, field: Symbol },
    RetVal,
}

impl Operand {
    /// `spec.md` §4.5: constant folding only fires when an operand is
    /// literally a number — not a temporary or variable that happens to
    /// hold one at some point in execution.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Int(n) => Some(*n as f64),
            Operand::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_int_literal(&self) -> bool {
        matches!(self, Operand::Int(_))
    }

    fn walk_temps(&self, out: &mut Vec<TempId>) {
        match self {
            Operand::Temp(t) => out.push(*t),
            Operand::Index { indices, .. } => {
                for idx in indices {
                    idx.walk_temps(out);
                }
            }
            _ => {}
        }
    }

    pub fn render(&self, interner: &Interner) -> String {
        match self {
            Operand::Int(n) => n.to_string(),
            Operand::Real(n) => n.to_string(),
            Operand::Str(s) => format!("\"{}\"", interner.resolve(*s)),
            Operand::Bool(b) => if *b { "1".to_string() } else { "0".to_string() },
            Operand::Var(name) => interner.resolve(*name).to_string(),
            Operand::Temp(t) => format!("T{t}"),
            Operand::Index { name, indices } => {
                let idx = indices.iter().map(|i| i.render(interner)).collect::<Vec<_>>().join(", ");
                format!("{}[{}]", interner.resolve(*name), idx)
            }
            Operand::Field { name, field } => {
                format!("{}.{}", interner.resolve(*name), interner.resolve(*field))
            }
            Operand::RetVal => "RETVAL".to_string(),
        }
    }
}

/// An assignment target: a plain name, an array element, or a record
/// field — the same three shapes `spec.md` §3's `Assignment` node allows.
#[derive(Clone, Debug, PartialEq)]
pub enum Place {
    Var(Symbol),
    Index { name: Symbol, indices: Vec<Operand> },
    Field { name: Symbol, field: Symbol },
}

impl Place {
    fn walk_temps(&self, out: &mut Vec<TempId>) {
        if let Place::Index { indices, .. } = self {
            for idx in indices {
                idx.walk_temps(out);
            }
        }
    }

    pub fn render(&self, interner: &Interner) -> String {
        match self {
            Place::Var(name) => interner.resolve(*name).to_string(),
            Place::Index { name, indices } => {
                let idx = indices.iter().map(|i| i.render(interner)).collect::<Vec<_>>().join(", ");
                format!("{}[{}]", interner.resolve(*name), idx)
            }
            Place::Field { name, field } => {
                format!("{}.{}", interner.resolve(*name), interner.resolve(*field))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
    Append,
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileMode::Read => write!(f, "READ"),
            FileMode::Write => write!(f, "WRITE"),
            FileMode::Append => write!(f, "APPEND"),
        }
    }
}

/// One line of IR, per `spec.md` §6's grammar. `dst` fields that hold a
/// bare `TempId` (not a full `Place`) are exactly the instructions dead
/// temporary elimination (`spec.md` §4.5) is allowed to drop.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// `Tn = <literal|var|access>` and `Tn = RETVAL`.
    AssignOperand { dst: TempId, src: Operand },
    /// `Tn = a OP b`.
    BinaryOp { dst: TempId, op: BinOp, lhs: Operand, rhs: Operand },
    /// `Tn = BUILTIN NAME args…`.
    Builtin { dst: TempId, name: &'static str, args: Vec<Operand> },
    /// `name = expr` / `name[i,j] = expr` / `name.field = expr`.
    Store { place: Place, value: Operand },
    /// `ARRAY name [a:b(,c:d)]`.
    Array { name: Symbol, dims: Vec<ArrayDim> },
    /// `LOCAL name`.
    Local { name: Symbol },
    Output { value: Operand },
    OutputPart { value: Operand },
    OutputEnd,
    Input { target: Place },
    Goto { label: Label },
    IfZero { value: Operand, label: Label },
    IfNonZero { value: Operand, label: Label },
    Push { value: Operand },
    /// `PUSH_REF name|__NONE__`.
    PushRef { target: Option<Place> },
    EnterScope,
    ExitScope,
    PopParam { name: Symbol },
    PopByRef { name: Symbol },
    WritebackByRef { name: Symbol },
    Call { label: Label },
    /// `RETVAL v`.
    SetRetVal { value: Operand },
    Ret,
    OpenFile { name: Operand, mode: FileMode },
    ReadFile { name: Operand, target: Place },
    WriteFile { name: Operand, value: Operand },
    CloseFile { name: Operand },
    Label(Label),
}

impl Instr {
    /// `Some(temp)` for the instructions whose target is a bare
    /// temporary — the only shapes dead-temporary elimination considers
    /// for removal (`spec.md` §4.5: "never eliminates side-effecting
    /// instructions").
    pub fn temp_target(&self) -> Option<TempId> {
        match self {
            Instr::AssignOperand { dst, .. }
            | Instr::BinaryOp { dst, .. }
            | Instr::Builtin { dst, .. } => Some(*dst),
            _ => None,
        }
    }

    /// Every temporary this instruction *reads* (never its own target),
    /// including ones nested inside `[ ]` index operands — exactly what
    /// `spec.md` §4.5 asks dead-temporary elimination to collect.
    pub fn read_temps(&self) -> Vec<TempId> {
        let mut out = Vec::new();
        match self {
            Instr::AssignOperand { src, .. } => src.walk_temps(&mut out),
            Instr::BinaryOp { lhs, rhs, .. } => {
                lhs.walk_temps(&mut out);
                rhs.walk_temps(&mut out);
            }
            Instr::Builtin { args, .. } => {
                for a in args {
                    a.walk_temps(&mut out);
                }
            }
            Instr::Store { place, value } => {
                place.walk_temps(&mut out);
                value.walk_temps(&mut out);
            }
            Instr::Output { value } | Instr::OutputPart { value } => value.walk_temps(&mut out),
            Instr::Input { target } => target.walk_temps(&mut out),
            Instr::IfZero { value, .. } | Instr::IfNonZero { value, .. } => value.walk_temps(&mut out),
            Instr::Push { value } => value.walk_temps(&mut out),
            Instr::PushRef { target: Some(place) } => place.walk_temps(&mut out),
            Instr::SetRetVal { value } => value.walk_temps(&mut out),
            Instr::OpenFile { name, .. } | Instr::CloseFile { name } => name.walk_temps(&mut out),
            Instr::ReadFile { name, target } => {
                name.walk_temps(&mut out);
                target.walk_temps(&mut out);
            }
            Instr::WriteFile { name, value } => {
                name.walk_temps(&mut out);
                value.walk_temps(&mut out);
            }
            _ => {}
        }
        out
    }

    pub fn render(&self, interner: &Interner) -> String {
        match self {
            Instr::AssignOperand { dst, src } => format!("T{dst} = {}", src.render(interner)),
            Instr::BinaryOp { dst, op, lhs, rhs } => {
                format!("T{dst} = {} {} {}", lhs.render(interner), render_binop(*op), rhs.render(interner))
            }
            Instr::Builtin { dst, name, args } => {
                let args = args.iter().map(|a| a.render(interner)).collect::<Vec<_>>().join(" ");
                format!("T{dst} = BUILTIN {name} {args}")
            }
            Instr::Store { place, value } => format!("{} = {}", place.render(interner), value.render(interner)),
            Instr::Array { name, dims } => {
                let dims = dims.iter().map(|d| format!("{}:{}", d.start, d.end)).collect::<Vec<_>>().join(", ");
                format!("ARRAY {} [{}]", interner.resolve(*name), dims)
            }
            Instr::Local { name } => format!("LOCAL {}", interner.resolve(*name)),
            Instr::Output { value } => format!("OUTPUT {}", value.render(interner)),
            Instr::OutputPart { value } => format!("OUTPUT_PART {}", value.render(interner)),
            Instr::OutputEnd => "OUTPUT_END".to_string(),
            Instr::Input { target } => format!("INPUT {}", target.render(interner)),
            Instr::Goto { label } => format!("GOTO {}", label.render(interner)),
            Instr::IfZero { value, label } => format!("IFZ {} GOTO {}", value.render(interner), label.render(interner)),
            Instr::IfNonZero { value, label } => {
                format!("IFNZ {} GOTO {}", value.render(interner), label.render(interner))
            }
            Instr::Push { value } => format!("PUSH {}", value.render(interner)),
            Instr::PushRef { target } => match target {
                Some(place) => format!("PUSH_REF {}", place.render(interner)),
                None => "PUSH_REF __NONE__".to_string(),
            },
            Instr::EnterScope => "ENTER_SCOPE".to_string(),
            Instr::ExitScope => "EXIT_SCOPE".to_string(),
            Instr::PopParam { name } => format!("POP_PARAM {}", interner.resolve(*name)),
            Instr::PopByRef { name } => format!("POP_BYREF {}", interner.resolve(*name)),
            Instr::WritebackByRef { name } => format!("WRITEBACK_BYREF {}", interner.resolve(*name)),
            Instr::Call { label } => format!("CALL {}", label.render(interner)),
            Instr::SetRetVal { value } => format!("RETVAL {}", value.render(interner)),
            Instr::Ret => "RET".to_string(),
            Instr::OpenFile { name, mode } => format!("OPENFILE {} {}", name.render(interner), mode),
            Instr::ReadFile { name, target } => format!("READFILE {} {}", name.render(interner), target.render(interner)),
            Instr::WriteFile { name, value } => format!("WRITEFILE {} {}", name.render(interner), value.render(interner)),
            Instr::CloseFile { name } => format!("CLOSEFILE {}", name.render(interner)),
            Instr::Label(label) => format!("{}:", label.render(interner)),
        }
    }
}

/// `spec.md` §6's op spellings for the IR grammar (`==`/`!=`/`&&`/`||`,
/// not the source language's `=`/`<>`/`AND`/`OR`).
pub fn render_binop(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Pow => "^",
        BinOp::IntDiv => "DIV",
        BinOp::IntMod => "MOD",
        BinOp::Concat => "&",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::Le => "<=",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
    }
}

/// Renders a full instruction sequence as the canonical textual IR,
/// one line per instruction, for host inspection and golden tests.
pub fn render_program(instrs: &[Instr], interner: &Interner) -> String {
    instrs.iter().map(|i| i.render(interner)).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_binop_matches_ir_grammar_spellings() {
        assert_eq!(render_binop(BinOp::Eq), "==");
        assert_eq!(render_binop(BinOp::And), "&&");
        assert_eq!(render_binop(BinOp::IntDiv), "DIV");
    }

    #[test]
    fn read_temps_walks_into_index_operands() {
        let mut interner = Interner::new();
        let target = interner.intern("Total");
        let arr = interner.intern("Nums");
        let instr = Instr::Store {
            place: Place::Var(target),
            value: Operand::Index { name: arr, indices: vec![Operand::Temp(7)] },
        };
        assert_eq!(instr.read_temps(), vec![7]);
    }
}
