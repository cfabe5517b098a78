//! Document model for Quire notebooks.
//!
//! A notebook is an ordered list of cells, each either literal prose or
//! executable code, plus front matter that only the publishing side reads.
//!
//! - `types` - Document, Cell, CellKind, Directives
//! - `front_matter` - YAML header
//! - `parser` - percent-format reader
//! - `writer` - percent-format writer

mod front_matter;
mod parser;
mod types;
mod writer;

pub use front_matter::{FrontMatter, KernelSpecInfo};
pub use parser::PercentParser;
pub use types::{Cell, CellId, CellKind, CellType, Directives, Document};
pub use writer::PercentWriter;
