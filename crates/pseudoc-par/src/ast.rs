//! Abstract syntax tree node definitions (`spec.md` §3).
//!
//! A program is a tree: statements own their children outright, so there
//! is no parent pointer and no lifetime coupling to the token stream —
//! once parsing finishes, the AST can outlive the source text.

use pseudoc_util::{Span, Symbol};

pub type Program = Vec<Stmt>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Real,
    String,
    Boolean,
    Char,
    /// A previously-declared `TYPE` record, or an as-yet-unresolved name
    /// the semantic analyser must look up.
    User(Symbol),
}

/// `{start:int, end:int}`, `spec.md` §3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayDim {
    pub start: i64,
    pub end: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamMode {
    ByVal,
    ByRef,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: Symbol,
    pub ty: DataType,
    pub mode: ParamMode,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct CaseBranch {
    pub values: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug)]
pub struct TypeField {
    pub name: Symbol,
    pub ty: DataType,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Declare {
        name: Symbol,
        data_type: DataType,
        array_dims: Option<Vec<ArrayDim>>,
        span: Span,
    },
    Constant {
        name: Symbol,
        value: Expr,
        span: Span,
    },
    TypeDef {
        name: Symbol,
        fields: Vec<TypeField>,
        span: Span,
    },
    Assignment {
        name: Symbol,
        indices: Option<Vec<Expr>>,
        field: Option<Symbol>,
        expr: Expr,
        span: Span,
    },
    Output {
        values: Vec<Expr>,
        span: Span,
    },
    Input {
        name: Symbol,
        indices: Option<Vec<Expr>>,
        field: Option<Symbol>,
        span: Span,
    },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    For {
        loop_var: Symbol,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Vec<Stmt>,
        span: Span,
    },
    Repeat {
        body: Vec<Stmt>,
        cond: Expr,
        span: Span,
    },
    Case {
        expr: Expr,
        branches: Vec<CaseBranch>,
        otherwise: Option<Vec<Stmt>>,
        span: Span,
    },
    Procedure {
        name: Symbol,
        params: Vec<Param>,
        body: Vec<Stmt>,
        span: Span,
    },
    Function {
        name: Symbol,
        params: Vec<Param>,
        returns: DataType,
        body: Vec<Stmt>,
        span: Span,
    },
    Call {
        name: Symbol,
        args: Vec<Expr>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    OpenFile {
        name: Expr,
        mode: FileMode,
        span: Span,
    },
    ReadFile {
        name: Expr,
        target: Symbol,
        span: Span,
    },
    WriteFile {
        name: Expr,
        data: Expr,
        span: Span,
    },
    CloseFile {
        name: Expr,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Declare { span, .. }
            | Stmt::Constant { span, .. }
            | Stmt::TypeDef { span, .. }
            | Stmt::Assignment { span, .. }
            | Stmt::Output { span, .. }
            | Stmt::Input { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Repeat { span, .. }
            | Stmt::Case { span, .. }
            | Stmt::Procedure { span, .. }
            | Stmt::Function { span, .. }
            | Stmt::Call { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::OpenFile { span, .. }
            | Stmt::ReadFile { span, .. }
            | Stmt::WriteFile { span, .. }
            | Stmt::CloseFile { span, .. } => *span,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
    Append,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    IntDiv,
    IntMod,
    Concat,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Negate,
    Not,
}

#[derive(Clone, Debug)]
pub enum Expr {
    IntegerLiteral(i64, Span),
    RealLiteral(f64, Span),
    StringLiteral(Symbol, Span),
    BooleanLiteral(bool, Span),
    Identifier(Symbol, Span),
    ArrayAccess {
        name: Symbol,
        indices: Vec<Expr>,
        span: Span,
    },
    FieldAccess {
        object: Box<Expr>,
        field: Symbol,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        span: Span,
    },
    Call {
        name: Symbol,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntegerLiteral(_, s)
            | Expr::RealLiteral(_, s)
            | Expr::StringLiteral(_, s)
            | Expr::BooleanLiteral(_, s)
            | Expr::Identifier(_, s)
            | Expr::ArrayAccess { span: s, .. }
            | Expr::FieldAccess { span: s, .. }
            | Expr::Binary { span: s, .. }
            | Expr::Unary { span: s, .. }
            | Expr::Call { span: s, .. } => *s,
        }
    }

    /// True for an integer literal, or a literal wrapped in a single
    /// unary negation — the shape `spec.md` §4.4 asks the IR generator to
    /// special-case when choosing a `FOR` loop's direction at compile time.
    pub fn as_signed_integer_literal(&self) -> Option<i64> {
        match self {
            Expr::IntegerLiteral(n, _) => Some(*n),
            Expr::Unary { op: UnOp::Negate, expr, .. } => match expr.as_ref() {
                Expr::IntegerLiteral(n, _) => Some(-*n),
                _ => None,
            },
            _ => None,
        }
    }
}
