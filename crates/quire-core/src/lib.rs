//! Core engine for Quire literate notebooks.
//!
//! This crate provides:
//! - Document model and percent-format (`# %%`) parser and writer
//! - A built-in script kernel for code cells
//! - The cell runner: ordered execution against one shared context
//! - Captured outputs and rendering to Markdown

pub mod document;
pub mod error;
pub mod execute;
pub mod render;
pub mod script;
pub mod state;

pub use document::{Cell, CellId, CellKind, CellType, Directives, Document, FrontMatter, PercentParser, PercentWriter};
pub use error::{CellExecutionError, Error, Result};
pub use execute::{
    AbortHandle, CellFailure, CellRunner, ExecutionCallback, ExecutionContext, Kernel,
    OutputCapture, RunState,
};
pub use render::{FigureRefs, RenderedBlock, render_blocks, to_markdown, write_figures};
pub use script::{ScriptConfig, ScriptKernel, Value};
pub use state::{CellOutput, FigureArtifact, OutputItem, StreamName};
