//! Execution engine for Quire notebooks.
//!
//! # Architecture
//!
//! ```text
//! Document
//!     │
//!     └── CellRunner<K: Kernel>
//!             │
//!             ├── Markdown cell → CellOutput::Prose
//!             │
//!             └── Code cell → Kernel::execute(source, &mut ExecutionContext, &mut OutputCapture)
//!                     │
//!                     └── captured items → CellOutput::Code
//! ```
//!
//! # Module Structure
//!
//! - `capture` - Per-cell output capture
//! - `context` - Shared execution context, warning filters, callbacks and abort handle
//! - `figure` - Figure tracking for opaque plotting calls
//! - `kernel` - The `Kernel` trait and kernel errors
//! - `runner` - `CellRunner` and its state machine

mod capture;
mod context;
mod figure;
mod kernel;
mod runner;

pub use capture::OutputCapture;
pub use context::{AbortHandle, ExecutionCallback, ExecutionContext, WarningAction, WarningFilters};
pub use figure::FigureState;
pub use kernel::{CellFailure, Kernel};
pub use runner::{CellRunner, RunState};
