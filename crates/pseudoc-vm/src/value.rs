//! Dynamic runtime values (`spec.md` §3 "Runtime value").

use pseudoc_par::ArrayDim;
use pseudoc_util::Symbol;
use rustc_hash::FxHashMap;

/// Dense storage for a declared `ARRAY`, 1-D or 2-D. Row-major when 2-D.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayValue {
    pub dims: Vec<ArrayDim>,
    data: Vec<Value>,
}

impl ArrayValue {
    /// Allocates dense, zero-filled storage over `dims` (`spec.md` §3:
    /// "Arrays are dense over their declared bounds: allocation
    /// zero-fills every in-range slot"). The IR's `ARRAY` instruction
    /// carries no element type, so every slot starts as `Value::Int(0)`
    /// regardless of the array's declared element type — a dynamically
    /// typed placeholder overwritten by the program's own assignments.
    pub fn new(dims: Vec<ArrayDim>) -> Self {
        let len = dims.iter().map(|d| (d.end - d.start + 1).max(0) as usize).product();
        Self { data: vec![Value::Int(0); len], dims }
    }

    fn offset(&self, indices: &[i64]) -> Option<usize> {
        if indices.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0usize;
        let mut stride = 1usize;
        for (dim, idx) in self.dims.iter().zip(indices.iter()).rev() {
            if *idx < dim.start || *idx > dim.end {
                return None;
            }
            offset += (*idx - dim.start) as usize * stride;
            stride *= (dim.end - dim.start + 1) as usize;
        }
        Some(offset)
    }

    pub fn get(&self, indices: &[i64]) -> Option<&Value> {
        self.offset(indices).map(|o| &self.data[o])
    }

    pub fn set(&mut self, indices: &[i64], value: Value) -> Option<()> {
        let offset = self.offset(indices)?;
        self.data[offset] = value;
        Some(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Real(f64),
    Str(String),
    Bool(bool),
    Record(FxHashMap<Symbol, Value>),
    Array(ArrayValue),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Real(n) => Some(n.trunc() as i64),
            _ => None,
        }
    }

    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::Int(n) => *n == 0,
            Value::Real(n) => *n == 0.0,
            _ => false,
        }
    }

    /// Parses a host-supplied `INPUT` string per `spec.md` §4.6: "if
    /// the provided string parses as a number, it is stored as a
    /// number; else as a string."
    pub fn from_input(raw: &str) -> Value {
        if let Ok(n) = raw.parse::<i64>() {
            Value::Int(n)
        } else if let Ok(n) = raw.parse::<f64>() {
            Value::Real(n)
        } else {
            Value::Str(raw.to_string())
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Real(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Record(_) => write!(f, "<record>"),
            Value::Array(_) => write!(f, "<array>"),
        }
    }
}
