//! Runtime values for script cells.

use std::cmp::Ordering;
use std::fmt;

use super::builtins::Builtin;
use super::error::{ErrorKind, ScriptError};

/// Largest sequence a cell may build, in elements (bytes for strings).
pub const MAX_SEQUENCE_LEN: usize = 1 << 24;

/// A value stored in the execution context.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Insertion-ordered mapping
    Dict(Vec<(Value, Value)>),
    Range {
        start: i64,
        stop: i64,
        step: i64,
    },
    Builtin(Builtin),
    /// An imported library module, by dotted path.
    Module(String),
    /// A value owned by an external library, named by the expression that produced it.
    Opaque(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Range { .. } => "range",
            Self::Builtin(_) => "builtin_function_or_method",
            Self::Module(_) => "module",
            Self::Opaque(_) => "object",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) | Self::Tuple(items) => !items.is_empty(),
            Self::Dict(pairs) => !pairs.is_empty(),
            Self::Range { .. } => range_len(self) > 0,
            Self::Builtin(_) | Self::Module(_) | Self::Opaque(_) => true,
        }
    }

    /// Numeric view used by arithmetic; bools count as ints.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Bool(b) => Some(Number::Int(i64::from(*b))),
            Self::Int(i) => Some(Number::Int(*i)),
            Self::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// `str(value)`.
    pub fn to_display(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => other.repr(),
        }
    }

    /// `repr(value)`.
    pub fn repr(&self) -> String {
        match self {
            Self::None => "None".to_string(),
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Str(s) => quote(s),
            Self::List(items) => format!("[{}]", join_repr(items)),
            Self::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Self::Tuple(items) => format!("({})", join_repr(items)),
            Self::Dict(pairs) => {
                let inner: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Self::Range { start, stop, step } if *step == 1 => format!("range({start}, {stop})"),
            Self::Range { start, stop, step } => format!("range({start}, {stop}, {step})"),
            Self::Builtin(b) => format!("<built-in function {}>", b.name()),
            Self::Module(path) => format!("<module '{path}'>"),
            Self::Opaque(path) => format!("<{path}>"),
        }
    }

    /// Equality with numeric coercion (`1 == 1.0`).
    pub fn py_eq(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return match (a, b) {
                (Number::Int(x), Number::Int(y)) => x == y,
                _ => a.to_f64() == b.to_f64(),
            };
        }
        match (self, other) {
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
            }
            (Self::Dict(a), Self::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter()
                            .find(|(k2, _)| k.py_eq(k2))
                            .is_some_and(|(_, v2)| v.py_eq(v2))
                    })
            }
            (a, b) => a == b,
        }
    }

    /// Ordering for `<`, `min`, `max`.
    pub fn py_cmp(&self, other: &Value) -> Result<Ordering, ScriptError> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a
                .to_f64()
                .partial_cmp(&b.to_f64())
                .ok_or_else(|| ScriptError::value_error("cannot order NaN"));
        }
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Ok(a.cmp(b)),
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.py_cmp(y)? {
                        Ordering::Equal => continue,
                        ord => return Ok(ord),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(ScriptError::type_error(format!(
                "'<' not supported between instances of '{}' and '{}'",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Iterate the value as Python would in a `for` loop.
    pub fn iter(&self) -> Result<ValueIter, ScriptError> {
        match self {
            Self::Range { start, stop, step } => Ok(ValueIter::Range {
                next: *start,
                stop: *stop,
                step: *step,
            }),
            Self::List(items) | Self::Tuple(items) => Ok(ValueIter::Items(items.clone().into_iter())),
            Self::Str(s) => Ok(ValueIter::Items(
                s.chars()
                    .map(|c| Value::Str(c.to_string()))
                    .collect::<Vec<_>>()
                    .into_iter(),
            )),
            Self::Dict(pairs) => Ok(ValueIter::Items(
                pairs
                    .iter()
                    .map(|(k, _)| k.clone())
                    .collect::<Vec<_>>()
                    .into_iter(),
            )),
            other => Err(ScriptError::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Collect an iterable into a vector.
    pub fn to_vec(&self) -> Result<Vec<Value>, ScriptError> {
        if matches!(self, Self::Range { .. }) && range_len(self) > MAX_SEQUENCE_LEN as i128 {
            return Err(ScriptError::new(
                ErrorKind::MemoryError,
                "sequence is too large",
            ));
        }
        Ok(self.iter()?.collect())
    }

    /// `len(value)`.
    pub fn len(&self) -> Result<usize, ScriptError> {
        match self {
            Self::Str(s) => Ok(s.chars().count()),
            Self::List(items) | Self::Tuple(items) => Ok(items.len()),
            Self::Dict(pairs) => Ok(pairs.len()),
            Self::Range { .. } => usize::try_from(range_len(self)).map_err(|_| too_long()),
            other => Err(ScriptError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        }
    }

    /// `value[index]` for built-in containers.
    pub fn index(&self, index: &Value) -> Result<Value, ScriptError> {
        match self {
            Self::List(items) | Self::Tuple(items) => {
                let i = normalize_index(index, items.len() as i128, self.type_name())?;
                Ok(items[i as usize].clone())
            }
            Self::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let i = normalize_index(index, chars.len() as i128, "string")?;
                Ok(Value::Str(chars[i as usize].to_string()))
            }
            Self::Range { start, step, .. } => {
                let i = normalize_index(index, range_len(self), "range object")?;
                let item = *start as i128 + *step as i128 * i;
                i64::try_from(item).map(Value::Int).map_err(|_| too_long())
            }
            Self::Dict(pairs) => pairs
                .iter()
                .find(|(k, _)| k.py_eq(index))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| ScriptError::new(ErrorKind::KeyError, index.repr())),
            other => Err(ScriptError::type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

/// Numeric operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    pub fn is_int(self) -> bool {
        matches!(self, Self::Int(_))
    }
}

/// Iterator over an iterable value.
pub enum ValueIter {
    Range { next: i64, stop: i64, step: i64 },
    Items(std::vec::IntoIter<Value>),
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            Self::Range { next, stop, step } => {
                let done = if *step > 0 { *next >= *stop } else { *next <= *stop };
                if done {
                    return None;
                }
                let current = *next;
                *next = next.saturating_add(*step);
                Some(Value::Int(current))
            }
            Self::Items(items) => items.next(),
        }
    }
}

/// Raised when a length does not fit a machine-sized integer.
pub(crate) fn too_long() -> ScriptError {
    ScriptError::new(
        ErrorKind::OverflowError,
        "Python int too large to convert to C ssize_t",
    )
}

fn range_len(value: &Value) -> i128 {
    let Value::Range { start, stop, step } = value else {
        return 0;
    };
    let (start, stop, step) = (*start as i128, *stop as i128, *step as i128);
    let len = if step > 0 {
        (stop - start + step - 1) / step
    } else {
        (start - stop - step - 1) / -step
    };
    len.max(0)
}

/// Resolve a possibly negative index against `len`; the result is in `0..len`.
fn normalize_index(index: &Value, len: i128, what: &str) -> Result<i128, ScriptError> {
    let i = index.as_int().ok_or_else(|| {
        ScriptError::type_error(format!(
            "{what} indices must be integers, not {}",
            index.type_name()
        ))
    })?;
    let i = i as i128;
    let resolved = if i < 0 { i + len } else { i };
    if resolved < 0 || resolved >= len {
        return Err(ScriptError::new(
            ErrorKind::IndexError,
            format!("{what} index out of range"),
        ));
    }
    Ok(resolved)
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

/// Quote a string the way Python's `repr` does.
fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

/// Format a float like Python's `repr`.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let formatted = format!("{f:e}");
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }
    if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}
