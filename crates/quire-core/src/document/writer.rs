//! Percent-format writer.
//!
//! Renders a [`Document`] back to the text format read by
//! [`PercentParser`](super::PercentParser).

use super::types::{CellKind, Document};
use crate::error::Result;

/// Writes documents as percent-format source.
#[derive(Debug, Default)]
pub struct PercentWriter;

impl PercentWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render a document to percent-format text.
    pub fn write(&self, doc: &Document) -> Result<String> {
        let mut out = String::new();

        if let Some(front_matter) = &doc.front_matter {
            out.push_str("# ---\n");
            for line in front_matter.to_yaml()?.lines() {
                push_commented(&mut out, line);
            }
            out.push_str("# ---\n");
        }

        for cell in &doc.cells {
            if !out.is_empty() {
                out.push('\n');
            }

            let title = cell
                .title
                .as_deref()
                .map(|t| format!(" {t}"))
                .unwrap_or_default();

            match &cell.kind {
                CellKind::Markdown { text } => {
                    out.push_str(&format!("# %% [markdown]{title}\n"));
                    for line in text.lines() {
                        push_commented(&mut out, line);
                    }
                }
                CellKind::Code { source, directives } => {
                    out.push_str(&format!("# %%{title}\n"));
                    for line in directives.to_lines() {
                        out.push_str(&line);
                        out.push('\n');
                    }
                    for line in source.lines() {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
            }
        }

        Ok(out)
    }
}

fn push_commented(out: &mut String, line: &str) {
    if line.is_empty() {
        out.push_str("#\n");
    } else {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Cell, Directives, PercentParser};

    #[test]
    fn test_write_then_parse_preserves_cells() {
        let hidden = Directives {
            echo: false,
            output: false,
            ..Default::default()
        };
        let doc = Document::from_cells([
            Cell::markdown(0, "Intro\n\nMore text"),
            Cell::code(1, "for i in range(9):\n    print(i)"),
            Cell::code_with(2, "import warnings", hidden),
        ]);

        let text = PercentWriter::new().write(&doc).unwrap();
        assert!(text.starts_with("# %% [markdown]\n# Intro\n#\n# More text\n"));

        let parsed = PercentParser::new().parse_source(&text).unwrap();
        assert_eq!(parsed.cells.len(), 3);
        for (a, b) in doc.cells.iter().zip(&parsed.cells) {
            assert_eq!(a.kind, b.kind);
        }
    }
}
