//! Captured cell outputs.
//!
//! Every cell in a run produces exactly one [`CellOutput`]. Code cells carry
//! the side effects their kernel produced, in order.

use serde::{Deserialize, Serialize};

/// Which standard stream a text item was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    Stdout,
    Stderr,
}

impl StreamName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// A figure produced by an opaque plotting call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureArtifact {
    /// Sequential number within the run, starting at 1
    pub id: u32,
    /// The call that opened the figure
    pub label: String,
    /// Library calls made while the figure was open
    pub calls: Vec<String>,
    /// MIME type of `data`
    pub mime: String,
    /// Rendered figure
    pub data: String,
}

impl FigureArtifact {
    /// Suggested file name when written to disk.
    pub fn file_name(&self) -> String {
        format!("figure-{}.svg", self.id)
    }
}

/// One captured side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Printed text.
    Stream { name: StreamName, text: String },
    /// A rendered figure.
    Figure(FigureArtifact),
    /// The error that stopped the cell.
    Error {
        kind: String,
        message: String,
        line: Option<usize>,
    },
}

impl OutputItem {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Stream { name: StreamName::Stderr, .. })
    }
}

/// Output attached to one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CellOutput {
    /// Markdown text, passed through verbatim.
    Prose { text: String },
    /// Result of a code cell.
    Code {
        /// Echoed source; `None` when the cell has `echo: false`.
        source: Option<String>,
        /// Captured side effects in production order.
        items: Vec<OutputItem>,
        /// Position among executed code cells, starting at 1.
        execution_count: Option<u32>,
    },
}

impl CellOutput {
    pub fn items(&self) -> &[OutputItem] {
        match self {
            Self::Prose { .. } => &[],
            Self::Code { items, .. } => items,
        }
    }

    /// Concatenated text written to stdout.
    pub fn stdout(&self) -> String {
        self.items()
            .iter()
            .filter_map(|item| match item {
                OutputItem::Stream {
                    name: StreamName::Stdout,
                    text,
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn figures(&self) -> impl Iterator<Item = &FigureArtifact> {
        self.items().iter().filter_map(|item| match item {
            OutputItem::Figure(figure) => Some(figure),
            _ => None,
        })
    }

    pub fn error(&self) -> Option<&OutputItem> {
        self.items()
            .iter()
            .find(|item| matches!(item, OutputItem::Error { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_concatenates_streams() {
        let output = CellOutput::Code {
            source: None,
            items: vec![
                OutputItem::Stream {
                    name: StreamName::Stdout,
                    text: "a\n".to_string(),
                },
                OutputItem::Stream {
                    name: StreamName::Stderr,
                    text: "UserWarning: w\n".to_string(),
                },
                OutputItem::Stream {
                    name: StreamName::Stdout,
                    text: "b\n".to_string(),
                },
            ],
            execution_count: Some(1),
        };
        assert_eq!(output.stdout(), "a\nb\n");
        assert!(output.items()[1].is_warning());
        assert!(output.error().is_none());
    }

    #[test]
    fn test_prose_has_no_items() {
        let output = CellOutput::Prose {
            text: "hello".to_string(),
        };
        assert!(output.items().is_empty());
        assert_eq!(output.figures().count(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let output = CellOutput::Prose {
            text: "hi".to_string(),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["kind"], "prose");
    }
}
