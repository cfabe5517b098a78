//! Output state for Quire runs.
//!
//! This module provides:
//! - Per-cell outputs (prose passthrough or captured side effects)
//! - Figure artifacts produced by opaque library calls

mod output;

pub use output::{CellOutput, FigureArtifact, OutputItem, StreamName};
