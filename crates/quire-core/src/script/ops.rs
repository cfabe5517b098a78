//! Operator semantics for built-in values.

use std::cmp::Ordering;

use super::ast::{BinOp, CmpOp, UnaryOp};
use super::error::{ErrorKind, ScriptError};
use super::value::{MAX_SEQUENCE_LEN, Number, Value};

fn overflow() -> ScriptError {
    ScriptError::new(ErrorKind::OverflowError, "integer overflow")
}

fn too_large() -> ScriptError {
    ScriptError::new(ErrorKind::MemoryError, "sequence is too large")
}

/// Length of `len` elements repeated `n` times, capped at [`MAX_SEQUENCE_LEN`].
fn repeated_len(len: usize, n: usize) -> Result<usize, ScriptError> {
    len.checked_mul(n)
        .filter(|total| *total <= MAX_SEQUENCE_LEN)
        .ok_or_else(too_large)
}

fn joined_len(a: usize, b: usize) -> Result<usize, ScriptError> {
    a.checked_add(b)
        .filter(|total| *total <= MAX_SEQUENCE_LEN)
        .ok_or_else(too_large)
}

fn zero_division(message: &str) -> ScriptError {
    ScriptError::new(ErrorKind::ZeroDivisionError, message)
}

fn unsupported(op: &str, left: &Value, right: &Value) -> ScriptError {
    ScriptError::type_error(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

/// Evaluate `left <op> right`.
pub fn binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, ScriptError> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return arithmetic(op, a, b);
    }

    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            joined_len(a.len(), b.len())?;
            Ok(Value::Str(format!("{a}{b}")))
        }
        (BinOp::Add, Value::Str(_), other) => Err(ScriptError::type_error(format!(
            "can only concatenate str (not \"{}\") to str",
            other.type_name()
        ))),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            joined_len(a.len(), b.len())?;
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            joined_len(a.len(), b.len())?;
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (BinOp::Mul, seq, count) | (BinOp::Mul, count, seq)
            if matches!(seq, Value::Str(_) | Value::List(_) | Value::Tuple(_))
                && matches!(count, Value::Int(_) | Value::Bool(_)) =>
        {
            // Negative counts give an empty sequence
            let n = count
                .as_int()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(0);
            Ok(match seq {
                Value::Str(s) => {
                    repeated_len(s.len(), n)?;
                    Value::Str(s.repeat(n))
                }
                Value::List(items) => Value::List(repeat(items, n)?),
                Value::Tuple(items) => Value::Tuple(repeat(items, n)?),
                _ => return Err(unsupported(op.symbol(), left, right)),
            })
        }
        _ => Err(unsupported(op.symbol(), left, right)),
    }
}

fn repeat(items: &[Value], n: usize) -> Result<Vec<Value>, ScriptError> {
    let mut out = Vec::with_capacity(repeated_len(items.len(), n)?);
    if !items.is_empty() {
        for _ in 0..n {
            out.extend_from_slice(items);
        }
    }
    Ok(out)
}

fn arithmetic(op: BinOp, a: Number, b: Number) -> Result<Value, ScriptError> {
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        return int_arithmetic(op, x, y);
    }
    let (x, y) = (a.to_f64(), b.to_f64());
    let result = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => {
            if y == 0.0 {
                return Err(zero_division("float division by zero"));
            }
            x / y
        }
        BinOp::FloorDiv => {
            if y == 0.0 {
                return Err(zero_division("float floor division by zero"));
            }
            (x / y).floor()
        }
        BinOp::Mod => {
            if y == 0.0 {
                return Err(zero_division("float modulo"));
            }
            float_mod(x, y)
        }
        BinOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(zero_division("0.0 cannot be raised to a negative power"));
            }
            x.powf(y)
        }
    };
    Ok(Value::Float(result))
}

fn int_arithmetic(op: BinOp, x: i64, y: i64) -> Result<Value, ScriptError> {
    let result = match op {
        BinOp::Add => x.checked_add(y),
        BinOp::Sub => x.checked_sub(y),
        BinOp::Mul => x.checked_mul(y),
        BinOp::Div => {
            if y == 0 {
                return Err(zero_division("division by zero"));
            }
            return Ok(Value::Float(x as f64 / y as f64));
        }
        BinOp::FloorDiv => {
            if y == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            x.checked_div_euclid(y).map(|q| {
                // div_euclid floors only for positive divisors
                if y < 0 && x.rem_euclid(y) != 0 { q - 1 } else { q }
            })
        }
        BinOp::Mod => {
            if y == 0 {
                return Err(zero_division("integer modulo by zero"));
            }
            x.checked_rem_euclid(y)
                .map(|r| if y < 0 && r != 0 { r + y } else { r })
        }
        BinOp::Pow => {
            if y < 0 {
                if x == 0 {
                    return Err(zero_division("0.0 cannot be raised to a negative power"));
                }
                return Ok(Value::Float((x as f64).powf(y as f64)));
            }
            u32::try_from(y).ok().and_then(|e| x.checked_pow(e))
        }
    };
    result.map(Value::Int).ok_or_else(overflow)
}

fn float_mod(x: f64, y: f64) -> f64 {
    let r = x % y;
    if r != 0.0 && (r < 0.0) != (y < 0.0) {
        r + y
    } else {
        r
    }
}

/// Evaluate a unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value, ScriptError> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!operand.truthy()));
    }
    let symbol = if op == UnaryOp::Neg { "-" } else { "+" };
    match (op, operand.as_number()) {
        (UnaryOp::Neg, Some(Number::Int(i))) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
        (UnaryOp::Neg, Some(Number::Float(f))) => Ok(Value::Float(-f)),
        (_, Some(Number::Int(i))) => Ok(Value::Int(i)),
        (_, Some(Number::Float(f))) => Ok(Value::Float(f)),
        _ => Err(ScriptError::type_error(format!(
            "bad operand type for unary {symbol}: '{}'",
            operand.type_name()
        ))),
    }
}

/// Evaluate one link of a comparison chain.
pub fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, ScriptError> {
    match op {
        CmpOp::Eq => Ok(left.py_eq(right)),
        CmpOp::NotEq => Ok(!left.py_eq(right)),
        CmpOp::Lt => Ok(ordered(left, right)? == Ordering::Less),
        CmpOp::LtE => Ok(ordered(left, right)? != Ordering::Greater),
        CmpOp::Gt => Ok(ordered(left, right)? == Ordering::Greater),
        CmpOp::GtE => Ok(ordered(left, right)? != Ordering::Less),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => contains(right, left).map(|found| !found),
        CmpOp::Is => Ok(identical(left, right)),
        CmpOp::IsNot => Ok(!identical(left, right)),
    }
}

fn ordered(left: &Value, right: &Value) -> Result<Ordering, ScriptError> {
    left.py_cmp(right)
}

fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        (Value::Module(a), Value::Module(b)) | (Value::Opaque(a), Value::Opaque(b)) => a == b,
        _ => false,
    }
}

/// `item in container`.
pub fn contains(container: &Value, item: &Value) -> Result<bool, ScriptError> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(ScriptError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|v| v.py_eq(item))),
        Value::Dict(pairs) => Ok(pairs.iter().any(|(k, _)| k.py_eq(item))),
        Value::Range { .. } => Ok(container.iter()?.any(|v| v.py_eq(item))),
        other => Err(ScriptError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}
