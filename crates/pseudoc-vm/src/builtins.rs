//! Built-in function dispatch (`spec.md` §4.6 "Built-ins").

use crate::error::{RuntimeError, RuntimeResult};
use crate::interp::Vm;
use crate::value::Value;
use rand::Rng;

pub(crate) fn call(vm: &mut Vm<'_>, name: &'static str, args: &[Value]) -> RuntimeResult<Value> {
    match name {
        "LENGTH" => {
            let s = string_arg(args, 0)?;
            Ok(Value::Int(s.chars().count() as i64))
        }
        "UCASE" | "TO_UPPER" => Ok(Value::Str(string_arg(args, 0)?.to_uppercase())),
        "LCASE" | "TO_LOWER" => Ok(Value::Str(string_arg(args, 0)?.to_lowercase())),
        "MID" => {
            let s = string_arg(args, 0)?;
            let start = int_arg(args, 1)?;
            let len = int_arg(args, 2)?;
            Ok(Value::Str(substring(&s, start, len)))
        }
        "LEFT" => {
            let s = string_arg(args, 0)?;
            let len = int_arg(args, 1)?;
            Ok(Value::Str(substring(&s, 1, len)))
        }
        "RIGHT" => {
            let s = string_arg(args, 0)?;
            let len = int_arg(args, 1)?;
            let total = s.chars().count() as i64;
            let start = (total - len + 1).max(1);
            Ok(Value::Str(substring(&s, start, len)))
        }
        "INT" => {
            let v = args.first().ok_or_else(|| RuntimeError::UnknownBuiltin(name.to_string()))?;
            let n = v.as_number().ok_or_else(|| RuntimeError::NotNumeric(v.to_string()))?;
            Ok(Value::Int(n.trunc() as i64))
        }
        "RAND" => {
            let n = int_arg(args, 0)?;
            if n <= 0 {
                return Ok(Value::Int(0));
            }
            Ok(Value::Int(vm.rng().gen_range(0..=n)))
        }
        "NUM_TO_STR" => {
            let v = args.first().ok_or_else(|| RuntimeError::UnknownBuiltin(name.to_string()))?;
            Ok(Value::Str(v.to_string()))
        }
        "STR_TO_NUM" => {
            let s = string_arg(args, 0)?;
            if let Ok(n) = s.trim().parse::<i64>() {
                Ok(Value::Int(n))
            } else if let Ok(n) = s.trim().parse::<f64>() {
                Ok(Value::Real(n))
            } else {
                Err(RuntimeError::NotNumeric(s))
            }
        }
        "CHR" => {
            let n = int_arg(args, 0)?;
            let c = char::from_u32(n as u32).ok_or_else(|| RuntimeError::NotNumeric(n.to_string()))?;
            Ok(Value::Str(c.to_string()))
        }
        "ASC" => {
            let s = string_arg(args, 0)?;
            let c = s.chars().next().ok_or_else(|| RuntimeError::NotNumeric(s.clone()))?;
            Ok(Value::Int(c as i64))
        }
        "EOF" => {
            let name = string_arg(args, 0)?;
            Ok(Value::Bool(vm.vfs().eof(&name)))
        }
        other => Err(RuntimeError::UnknownBuiltin(other.to_string())),
    }
}

fn string_arg(args: &[Value], i: usize) -> RuntimeResult<String> {
    args.get(i).map(|v| v.to_string()).ok_or_else(|| RuntimeError::NotNumeric(format!("arg {i}")))
}

fn int_arg(args: &[Value], i: usize) -> RuntimeResult<i64> {
    args.get(i)
        .and_then(Value::as_int)
        .ok_or_else(|| RuntimeError::NotNumeric(format!("arg {i}")))
}

/// 1-based, length-clamped substring, matching `spec.md` §4.6's `MID`/
/// `LEFT`/`RIGHT` semantics.
fn substring(s: &str, start: i64, len: i64) -> String {
    let chars: Vec<char> = s.chars().collect();
    let start_idx = (start - 1).max(0) as usize;
    if start_idx >= chars.len() || len <= 0 {
        return String::new();
    }
    let end_idx = (start_idx + len as usize).min(chars.len());
    chars[start_idx..end_idx].iter().collect()
}
