//! The seam between the runner and the language that evaluates code cells.

use super::capture::OutputCapture;
use super::context::ExecutionContext;

/// Evaluates the source of one code cell against the shared context.
///
/// Implementations write side effects to `capture` as they happen. Whatever
/// was captured before an error is kept as the cell's partial output.
pub trait Kernel {
    /// Language name, used for fenced source blocks and notebook metadata.
    fn language(&self) -> &str;

    fn execute(
        &mut self,
        source: &str,
        ctx: &mut ExecutionContext,
        capture: &mut OutputCapture,
    ) -> Result<(), CellFailure>;
}

/// A kernel-level error raised by a cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CellFailure {
    /// Error category, e.g. `NameError`
    pub kind: String,
    pub message: String,
    /// 1-based line within the cell source
    pub line: Option<usize>,
}

impl CellFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            line: None,
        }
    }
}
