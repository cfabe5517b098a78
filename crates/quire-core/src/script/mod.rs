//! Built-in script kernel.
//!
//! Evaluates a small Python-flavoured statement language: literals, names,
//! arithmetic, comparisons, `for`/`while`/`if`, imports and calls. Imports
//! other than the built-in `warnings` module bind opaque library values;
//! calls on them are recorded, and configured plotting calls produce
//! figure artifacts.
//!
//! # Example
//!
//! ```
//! use quire_core::execute::{ExecutionContext, Kernel, OutputCapture};
//! use quire_core::script::{ScriptKernel, Value};
//!
//! let mut kernel = ScriptKernel::default();
//! let mut ctx = ExecutionContext::new();
//! let mut capture = OutputCapture::new();
//!
//! kernel.execute("x = 5\nprint(x)", &mut ctx, &mut capture).unwrap();
//! assert_eq!(ctx.get("x"), Some(&Value::Int(5)));
//! ```

mod ast;
mod builtins;
mod error;
mod interpreter;
mod lexer;
mod ops;
mod parser;
mod value;

pub use builtins::Builtin;
pub use error::{ErrorKind, ScriptError};
pub use value::{Value, format_float};

use crate::execute::{CellFailure, ExecutionContext, Kernel, OutputCapture};
use interpreter::Interpreter;
use parser::parse_program;

/// Library call names that open a figure.
const DEFAULT_FIGURE_CALLS: &[&str] = &[
    "subplots",
    "figure",
    "plot",
    "boxplot",
    "stripplot",
    "scatter",
    "hist",
    "bar",
    "barh",
    "lineplot",
    "scatterplot",
    "histplot",
    "jointplot",
    "imshow",
    "fit_transform",
];

/// Library call names that close and emit the open figure.
const DEFAULT_SHOW_CALLS: &[&str] = &["show", "poof"];

/// Script kernel settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    pub figure_calls: Vec<String>,
    pub show_calls: Vec<String>,
    /// Loop iterations allowed per cell before a `RuntimeError`
    pub max_loop_iterations: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            figure_calls: DEFAULT_FIGURE_CALLS.iter().map(|s| s.to_string()).collect(),
            show_calls: DEFAULT_SHOW_CALLS.iter().map(|s| s.to_string()).collect(),
            max_loop_iterations: 1_000_000,
        }
    }
}

/// The built-in kernel.
#[derive(Debug, Clone, Default)]
pub struct ScriptKernel {
    config: ScriptConfig,
}

impl ScriptKernel {
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }
}

impl Kernel for ScriptKernel {
    fn language(&self) -> &str {
        "python"
    }

    fn execute(
        &mut self,
        source: &str,
        ctx: &mut ExecutionContext,
        capture: &mut OutputCapture,
    ) -> Result<(), CellFailure> {
        let program = parse_program(source)?;
        let result = Interpreter::new(ctx, capture, &self.config).run(&program);

        match result {
            Ok(()) => {
                // A figure left open at the end of a cell is rendered inline.
                if let Some(figure) = ctx.figures.close() {
                    tracing::debug!("Flushing figure {} at end of cell", figure.id);
                    capture.figure(figure);
                }
                Ok(())
            }
            Err(err) => {
                ctx.figures.discard();
                Err(err.into())
            }
        }
    }
}
