//! Three-address IR: instruction model and AST-to-IR generator
//! (`spec.md` §3, §4.4, §6).

mod gen;
mod instr;

pub use gen::generate;
pub use instr::{render_binop, render_program, FileMode, Instr, Label, Operand, Place, TempId};
