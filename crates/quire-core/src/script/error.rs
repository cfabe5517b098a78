//! Errors raised while parsing or evaluating script cells.

use std::fmt;

use crate::execute::CellFailure;

/// Python-style error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SyntaxError,
    IndentationError,
    NameError,
    TypeError,
    ValueError,
    ZeroDivisionError,
    IndexError,
    KeyError,
    AttributeError,
    ImportError,
    OverflowError,
    MemoryError,
    RuntimeError,
    /// A warning escalated by an `error` filter; carries the category name.
    Warning(&'static str),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning(category) => f.write_str(category),
            other => write!(f, "{other:?}"),
        }
    }
}

/// An error raised by the script kernel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based line within the cell source.
    pub line: Option<usize>,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message).at_line(line)
    }

    pub fn undefined(name: &str) -> Self {
        Self::new(ErrorKind::NameError, format!("name '{name}' is not defined"))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    /// Attach a line number unless one is already set.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line.get_or_insert(line);
        self
    }
}

impl From<ScriptError> for CellFailure {
    fn from(err: ScriptError) -> Self {
        CellFailure {
            kind: err.kind.to_string(),
            message: err.message,
            line: err.line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ScriptError::undefined("x");
        assert_eq!(err.to_string(), "NameError: name 'x' is not defined");
        assert_eq!(ErrorKind::Warning("FutureWarning").to_string(), "FutureWarning");
    }

    #[test]
    fn test_at_line_keeps_innermost() {
        let err = ScriptError::undefined("x").at_line(3).at_line(1);
        assert_eq!(err.line, Some(3));
    }
}
