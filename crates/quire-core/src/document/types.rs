//! Types for the document model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::front_matter::FrontMatter;

/// Position of a cell within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub(crate) usize);

impl CellId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell_{}", self.0)
    }
}

/// Type of cell in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Prose, never executed.
    Markdown,
    /// Executable statements.
    Code,
}

/// Per-cell flags written as `#| key: value` lines.
///
/// Directives change how a cell's output is presented, not what it does,
/// with the exception of `eval`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directives {
    /// Show the cell source in the output stream.
    pub echo: bool,
    /// Keep captured side effects.
    pub output: bool,
    /// Execute the cell at all.
    pub eval: bool,
    /// Keep captured warnings.
    pub warning: bool,
    /// Optional label for progress reporting.
    pub label: Option<String>,
    /// Unknown directives, preserved verbatim.
    pub extra: BTreeMap<String, String>,
}

impl Default for Directives {
    fn default() -> Self {
        Self {
            echo: true,
            output: true,
            eval: true,
            warning: true,
            label: None,
            extra: BTreeMap::new(),
        }
    }
}

impl Directives {
    /// Whether every directive has its default value.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Directive lines in source order (`#| key: value`), defaults omitted.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(label) = &self.label {
            lines.push(format!("#| label: {label}"));
        }
        for (key, value, default) in [
            ("echo", self.echo, true),
            ("output", self.output, true),
            ("eval", self.eval, true),
            ("warning", self.warning, true),
        ] {
            if value != default {
                lines.push(format!("#| {key}: {value}"));
            }
        }
        for (key, value) in &self.extra {
            lines.push(format!("#| {key}: {value}"));
        }
        lines
    }
}

/// Cell content: literal prose or executable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum CellKind {
    Markdown {
        text: String,
    },
    Code {
        source: String,
        directives: Directives,
    },
}

/// A single literal unit of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Position in the document
    pub id: CellId,
    /// 1-based line of the cell marker in the source file
    pub line: usize,
    /// Title written after the `# %%` marker, if any
    pub title: Option<String>,
    /// Cell content
    pub kind: CellKind,
}

impl Cell {
    /// Create a markdown cell.
    pub fn markdown(id: usize, text: impl Into<String>) -> Self {
        Self {
            id: CellId::new(id),
            line: 0,
            title: None,
            kind: CellKind::Markdown { text: text.into() },
        }
    }

    /// Create a code cell with default directives.
    pub fn code(id: usize, source: impl Into<String>) -> Self {
        Self::code_with(id, source, Directives::default())
    }

    /// Create a code cell with explicit directives.
    pub fn code_with(id: usize, source: impl Into<String>, directives: Directives) -> Self {
        Self {
            id: CellId::new(id),
            line: 0,
            title: None,
            kind: CellKind::Code {
                source: source.into(),
                directives,
            },
        }
    }

    pub fn cell_type(&self) -> CellType {
        match self.kind {
            CellKind::Markdown { .. } => CellType::Markdown,
            CellKind::Code { .. } => CellType::Code,
        }
    }

    /// Literal text for markdown cells, source for code cells.
    pub fn text(&self) -> &str {
        match &self.kind {
            CellKind::Markdown { text } => text,
            CellKind::Code { source, .. } => source,
        }
    }

    /// Directives of a code cell.
    pub fn directives(&self) -> Option<&Directives> {
        match &self.kind {
            CellKind::Code { directives, .. } => Some(directives),
            CellKind::Markdown { .. } => None,
        }
    }

    /// Human-readable name: label directive, marker title, or the cell id.
    pub fn display_name(&self) -> String {
        self.directives()
            .and_then(|d| d.label.clone())
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// An ordered sequence of cells plus opaque front matter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Publishing metadata, never read by the runner
    pub front_matter: Option<FrontMatter>,
    /// Cells in authoring order
    pub cells: Vec<Cell>,
}

impl Document {
    /// Create a document from cells, renumbering their ids by position.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut doc = Self {
            front_matter: None,
            cells: cells.into_iter().collect(),
        };
        doc.renumber();
        doc
    }

    /// Reassign cell ids so they match positions.
    pub fn renumber(&mut self) {
        for (i, cell) in self.cells.iter_mut().enumerate() {
            cell.id = CellId::new(i);
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn code_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells
            .iter()
            .filter(|c| c.cell_type() == CellType::Code)
    }

    pub fn title(&self) -> Option<&str> {
        self.front_matter.as_ref().and_then(|f| f.title.as_deref())
    }
}
