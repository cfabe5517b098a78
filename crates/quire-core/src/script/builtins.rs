//! Built-in functions and the `warnings` module.

use super::ast::BinOp;
use super::error::{ErrorKind, ScriptError};
use super::ops;
use super::value::{Value, too_long};
use crate::execute::{ExecutionContext, OutputCapture, WarningAction};

/// Warning categories known to the kernel. `Warning` matches all of them.
const CATEGORIES: &[&str] = &[
    "Warning",
    "UserWarning",
    "DeprecationWarning",
    "FutureWarning",
    "RuntimeWarning",
];

/// A function implemented by the kernel itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Range,
    Len,
    Str,
    Int,
    Float,
    Bool,
    Abs,
    Min,
    Max,
    Sum,
    List,
    Repr,
    FilterWarnings,
    SimpleFilter,
    ResetWarnings,
    Warn,
    /// A warning category class
    Category(&'static str),
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Range => "range",
            Self::Len => "len",
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
            Self::List => "list",
            Self::Repr => "repr",
            Self::FilterWarnings => "filterwarnings",
            Self::SimpleFilter => "simplefilter",
            Self::ResetWarnings => "resetwarnings",
            Self::Warn => "warn",
            Self::Category(name) => *name,
        }
    }

    /// Resolve a global builtin name.
    pub fn lookup(name: &str) -> Option<Self> {
        let builtin = match name {
            "print" => Self::Print,
            "range" => Self::Range,
            "len" => Self::Len,
            "str" => Self::Str,
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "abs" => Self::Abs,
            "min" => Self::Min,
            "max" => Self::Max,
            "sum" => Self::Sum,
            "list" => Self::List,
            "repr" => Self::Repr,
            other => return category(other).map(Self::Category),
        };
        Some(builtin)
    }

    /// Resolve an attribute of the built-in `warnings` module.
    pub fn warnings_attr(name: &str) -> Option<Self> {
        match name {
            "filterwarnings" => Some(Self::FilterWarnings),
            "simplefilter" => Some(Self::SimpleFilter),
            "resetwarnings" => Some(Self::ResetWarnings),
            "warn" => Some(Self::Warn),
            other => category(other).map(Self::Category),
        }
    }

    pub fn call(
        self,
        args: Vec<Value>,
        mut kwargs: Vec<(String, Value)>,
        ctx: &mut ExecutionContext,
        capture: &mut OutputCapture,
    ) -> Result<Value, ScriptError> {
        let name = self.name();
        match self {
            Self::Print => {
                let sep = text_kwarg(&mut kwargs, "sep", " ")?;
                let end = text_kwarg(&mut kwargs, "end", "\n")?;
                take(&mut kwargs, "flush");
                no_kwargs(name, &kwargs)?;
                let parts: Vec<String> = args.iter().map(Value::to_display).collect();
                capture.stdout(&format!("{}{end}", parts.join(sep.as_str())));
                Ok(Value::None)
            }
            Self::Range => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 3)?;
                let ints = args.iter().map(index_int).collect::<Result<Vec<_>, _>>()?;
                let (start, stop, step) = match ints.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] => (*start, *stop, *step),
                    _ => (0, 0, 1),
                };
                if step == 0 {
                    return Err(ScriptError::value_error("range() arg 3 must not be zero"));
                }
                Ok(Value::Range { start, stop, step })
            }
            Self::Len => {
                let [value] = exactly(name, args, &kwargs)?;
                i64::try_from(value.len()?)
                    .map(Value::Int)
                    .map_err(|_| too_long())
            }
            Self::Str => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                Ok(Value::Str(args.first().map(Value::to_display).unwrap_or_default()))
            }
            Self::Repr => {
                let [value] = exactly(name, args, &kwargs)?;
                Ok(Value::Str(value.repr()))
            }
            Self::Int => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                args.first().map_or(Ok(Value::Int(0)), to_int)
            }
            Self::Float => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                args.first().map_or(Ok(Value::Float(0.0)), to_float)
            }
            Self::Bool => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                Ok(Value::Bool(args.first().is_some_and(Value::truthy)))
            }
            Self::Abs => {
                let [value] = exactly(name, args, &kwargs)?;
                match value {
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => match other.as_int() {
                        Some(i) => i.checked_abs().map(Value::Int).ok_or_else(|| {
                            ScriptError::new(ErrorKind::OverflowError, "integer overflow")
                        }),
                        None => Err(ScriptError::type_error(format!(
                            "bad operand type for abs(): '{}'",
                            other.type_name()
                        ))),
                    },
                }
            }
            Self::Min | Self::Max => {
                no_kwargs(name, &kwargs)?;
                let items = match args.len() {
                    0 => {
                        return Err(ScriptError::type_error(format!(
                            "{name} expected at least 1 argument, got 0"
                        )));
                    }
                    1 => args[0].to_vec()?,
                    _ => args,
                };
                let mut iter = items.into_iter();
                let mut best = iter.next().ok_or_else(|| {
                    ScriptError::value_error(format!("{name}() iterable argument is empty"))
                })?;
                for item in iter {
                    let ordering = item.py_cmp(&best)?;
                    let better = if self == Self::Min {
                        ordering.is_lt()
                    } else {
                        ordering.is_gt()
                    };
                    if better {
                        best = item;
                    }
                }
                Ok(best)
            }
            Self::Sum => {
                let start = take(&mut kwargs, "start");
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 2)?;
                let mut total = start
                    .or_else(|| args.get(1).cloned())
                    .unwrap_or(Value::Int(0));
                if let Value::Str(_) = total {
                    return Err(ScriptError::type_error(
                        "sum() can't sum strings [use ''.join(seq) instead]",
                    ));
                }
                for item in args[0].iter()? {
                    total = ops::binary(BinOp::Add, &total, &item)?;
                }
                Ok(total)
            }
            Self::List => {
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                match args.first() {
                    Some(value) => Ok(Value::List(value.to_vec()?)),
                    None => Ok(Value::List(Vec::new())),
                }
            }
            Self::FilterWarnings | Self::SimpleFilter => {
                let action = take(&mut kwargs, "action").or_else(|| args.first().cloned());
                let message = if self == Self::FilterWarnings {
                    take(&mut kwargs, "message").or_else(|| args.get(1).cloned())
                } else {
                    None
                };
                let category_arg = take(&mut kwargs, "category").or_else(|| {
                    let position = if self == Self::FilterWarnings { 2 } else { 1 };
                    args.get(position).cloned()
                });
                for ignored in ["module", "lineno", "append"] {
                    take(&mut kwargs, ignored);
                }
                no_kwargs(name, &kwargs)?;

                let action = match action {
                    Some(Value::Str(action)) => WarningAction::parse(&action)
                        .ok_or_else(|| ScriptError::value_error(format!("invalid action: '{action}'")))?,
                    Some(other) => {
                        return Err(ScriptError::type_error(format!(
                            "action must be a string, not '{}'",
                            other.type_name()
                        )));
                    }
                    None => {
                        return Err(ScriptError::type_error(format!(
                            "{name}() missing required argument 'action'"
                        )));
                    }
                };
                let message = match message {
                    Some(Value::Str(message)) => message,
                    None => String::new(),
                    Some(other) => {
                        return Err(ScriptError::type_error(format!(
                            "message must be a string, not '{}'",
                            other.type_name()
                        )));
                    }
                };
                let category = match category_arg {
                    None | Some(Value::Builtin(Self::Category("Warning"))) => None,
                    Some(Value::Builtin(Self::Category(name))) => Some(name),
                    Some(other) => {
                        return Err(ScriptError::type_error(format!(
                            "category must be a Warning subclass, not '{}'",
                            other.type_name()
                        )));
                    }
                };
                ctx.warnings.add(action, &message, category);
                Ok(Value::None)
            }
            Self::ResetWarnings => {
                exactly::<0>(name, args, &kwargs)?;
                ctx.warnings.reset();
                Ok(Value::None)
            }
            Self::Warn => {
                let category = take(&mut kwargs, "category").or_else(|| args.get(1).cloned());
                take(&mut kwargs, "stacklevel");
                no_kwargs(name, &kwargs)?;
                arity(name, &args, 1, 3)?;

                let category = match category {
                    None => "UserWarning",
                    Some(Value::Builtin(Self::Category(name))) => name,
                    Some(other) => {
                        return Err(ScriptError::type_error(format!(
                            "category must be a Warning subclass, not '{}'",
                            other.type_name()
                        )));
                    }
                };
                let message = args[0].to_display();
                match ctx.warnings.resolve(category, &message) {
                    WarningAction::Ignore => {}
                    WarningAction::Error => {
                        return Err(ScriptError::new(ErrorKind::Warning(category), message));
                    }
                    WarningAction::Always | WarningAction::Default => {
                        capture.stderr(&format!("{category}: {message}\n"));
                    }
                }
                Ok(Value::None)
            }
            Self::Category(category) => Err(ScriptError::type_error(format!(
                "{category} cannot be instantiated by this kernel"
            ))),
        }
    }
}

fn category(name: &str) -> Option<&'static str> {
    CATEGORIES.iter().copied().find(|c| *c == name)
}

fn take(kwargs: &mut Vec<(String, Value)>, key: &str) -> Option<Value> {
    let position = kwargs.iter().position(|(k, _)| k == key)?;
    Some(kwargs.remove(position).1)
}

fn no_kwargs(name: &str, kwargs: &[(String, Value)]) -> Result<(), ScriptError> {
    match kwargs.first() {
        Some((key, _)) => Err(ScriptError::type_error(format!(
            "'{key}' is an invalid keyword argument for {name}()"
        ))),
        None => Ok(()),
    }
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), ScriptError> {
    if args.len() < min {
        return Err(ScriptError::type_error(format!(
            "{name}() expected at least {min} argument(s), got {}",
            args.len()
        )));
    }
    if args.len() > max {
        return Err(ScriptError::type_error(format!(
            "{name}() expected at most {max} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn exactly<const N: usize>(
    name: &str,
    args: Vec<Value>,
    kwargs: &[(String, Value)],
) -> Result<[Value; N], ScriptError> {
    no_kwargs(name, kwargs)?;
    let count = args.len();
    args.try_into().map_err(|_| {
        ScriptError::type_error(format!(
            "{name}() takes exactly {N} argument(s) ({count} given)"
        ))
    })
}

fn text_kwarg(
    kwargs: &mut Vec<(String, Value)>,
    key: &str,
    default: &str,
) -> Result<String, ScriptError> {
    match take(kwargs, key) {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(Value::Str(s)) => Ok(s),
        Some(other) => Err(ScriptError::type_error(format!(
            "{key} must be None or a string, not {}",
            other.type_name()
        ))),
    }
}

fn index_int(value: &Value) -> Result<i64, ScriptError> {
    value.as_int().ok_or_else(|| {
        ScriptError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn to_int(value: &Value) -> Result<Value, ScriptError> {
    match value {
        Value::Float(f) if f.is_nan() => Err(ScriptError::value_error(
            "cannot convert float NaN to integer",
        )),
        Value::Float(f) if f.is_infinite() || f.abs() >= 9.223_372_036_854_776e18 => Err(
            ScriptError::new(ErrorKind::OverflowError, "cannot convert float infinity to integer"),
        ),
        Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s
            .trim()
            .replace('_', "")
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| {
                ScriptError::value_error(format!(
                    "invalid literal for int() with base 10: {}",
                    value.repr()
                ))
            }),
        other => other.as_int().map(Value::Int).ok_or_else(|| {
            ScriptError::type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn to_float(value: &Value) -> Result<Value, ScriptError> {
    match value {
        Value::Str(s) => {
            let trimmed = s.trim().to_lowercase();
            let parsed = match trimmed.as_str() {
                "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
                "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
                "nan" | "+nan" | "-nan" => Some(f64::NAN),
                other => other.replace('_', "").parse::<f64>().ok(),
            };
            parsed.map(Value::Float).ok_or_else(|| {
                ScriptError::value_error(format!(
                    "could not convert string to float: {}",
                    value.repr()
                ))
            })
        }
        other => other
            .as_number()
            .map(|n| Value::Float(n.to_f64()))
            .ok_or_else(|| {
                ScriptError::type_error(format!(
                    "float() argument must be a string or a real number, not '{}'",
                    other.type_name()
                ))
            }),
    }
}
