//! Runtime error taxonomy (`spec.md` §7(d)).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("array index out of bounds: {name}[{indices:?}]")]
    IndexOutOfBounds { name: String, indices: Vec<i64> },
    #[error("file '{0}' is not open")]
    FileNotOpen(String),
    #[error("file '{name}' is not open for {expected}")]
    WrongFileMode { name: String, expected: &'static str },
    #[error("read past end of file '{0}'")]
    EndOfFile(String),
    #[error("'{0}' is not numeric")]
    NotNumeric(String),
    #[error("unknown built-in function '{0}'")]
    UnknownBuiltin(String),
    #[error("step limit of {0} instructions exceeded")]
    StepLimitExceeded(u64),
    #[error("execution cancelled")]
    Cancelled,
    #[error("no more input available")]
    InputExhausted,
    #[error("label '{0}' is undefined")]
    UndefinedLabel(String),
    #[error("call stack underflow")]
    CallStackUnderflow,
    #[error("'{0}' is not a record")]
    NotARecord(String),
    #[error("'{0}' is not an array")]
    NotAnArray(String),
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
