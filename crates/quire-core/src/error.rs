//! Error types for quire-core.

use thiserror::Error;

use crate::state::CellOutput;

/// Result type for quire-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quire-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to parse notebook source.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Front matter is not valid YAML.
    #[error("front matter error: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    /// A code cell failed; the run was halted.
    #[error(transparent)]
    CellExecution(#[from] CellExecutionError),

    /// Execution was aborted by user request.
    #[error("execution aborted")]
    Aborted,

    /// Invalid operation (e.g., running a finished runner again).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a parse error for the given 1-based line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Render the error together with a short recovery hint.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Self::Parse { .. } => {
                "cells start with `# %%`; prose cells with `# %% [markdown]`"
            }
            Self::FrontMatter(_) => "the `# ---` header must contain valid YAML",
            Self::CellExecution(_) => {
                "fix the failing cell; cells after it were not executed"
            }
            Self::Aborted => "the run was interrupted before it finished",
            Self::InvalidOperation(_) => "create a new runner for each run",
            Self::Io(_) => "check that the notebook path exists and is readable",
        };
        format!("{self}\n  hint: {hint}")
    }
}

/// A code cell raised an error during execution.
///
/// `outputs` holds everything produced before the failure, including the
/// failing cell's partial output, so hosts can still render the run.
#[derive(Debug, Clone, Error)]
#[error("cell {index} failed: {kind}: {message}{}", .line.map(|l| format!(" (line {l})")).unwrap_or_default())]
pub struct CellExecutionError {
    /// Position of the failing cell in the document.
    pub index: usize,
    /// Error kind reported by the kernel (e.g. `NameError`).
    pub kind: String,
    /// Error detail.
    pub message: String,
    /// Line within the cell source, if known.
    pub line: Option<usize>,
    /// Outputs produced up to and including the failing cell.
    pub outputs: Vec<CellOutput>,
}
