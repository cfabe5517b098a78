//! Parser for percent-format notebooks.
//!
//! ```text
//! # ---
//! # title: My Post
//! # ---
//!
//! # %% [markdown]
//! # Some prose
//!
//! # %%
//! #| echo: false
//! x = 5
//! ```

use std::fs;
use std::path::Path;

use super::front_matter::FrontMatter;
use super::types::{Cell, CellId, CellKind, Directives, Document};
use crate::error::{Error, Result};

const MARKER: &str = "# %%";
const FRONT_MATTER_FENCE: &str = "# ---";
const DIRECTIVE_PREFIX: &str = "#|";

/// Parser for percent-format notebooks.
pub struct PercentParser {
    // Reserved for future configuration
}

/// The `[type]` tag of a cell marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Code,
    Markdown,
    /// Passed through untouched by Jupyter tooling; never rendered or run.
    Raw,
}

/// Cell boundaries found while scanning the source.
struct RawCell<'a> {
    line: usize,
    kind: MarkerKind,
    title: Option<String>,
    body: Vec<&'a str>,
}

impl PercentParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self {}
    }

    /// Parse a notebook file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Document> {
        let source = fs::read_to_string(path.as_ref())?;
        self.parse_source(&source)
    }

    /// Parse notebook source into a document.
    pub fn parse_source(&self, source: &str) -> Result<Document> {
        let lines: Vec<&str> = source.lines().collect();
        let (front_matter, body_start) = self.extract_front_matter(&lines)?;

        let raw_cells = self.split_cells(&lines, body_start)?;
        let mut cells = Vec::with_capacity(raw_cells.len());

        for raw in raw_cells {
            let id = CellId::new(cells.len());
            let kind = match raw.kind {
                MarkerKind::Markdown => CellKind::Markdown {
                    text: self.uncomment_markdown(&raw.body),
                },
                MarkerKind::Code => {
                    let (directives, source) = self.extract_directives(&raw.body, raw.line)?;
                    CellKind::Code { source, directives }
                }
                MarkerKind::Raw => {
                    tracing::warn!("Skipping raw cell at line {}", raw.line);
                    continue;
                }
            };
            cells.push(Cell {
                id,
                line: raw.line,
                title: raw.title,
                kind,
            });
        }

        tracing::debug!("Parsed {} cells", cells.len());

        Ok(Document {
            front_matter,
            cells,
        })
    }

    /// Extract the `# ---` header, returning it and the index of the first body line.
    fn extract_front_matter(&self, lines: &[&str]) -> Result<(Option<FrontMatter>, usize)> {
        let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
            return Ok((None, lines.len()));
        };
        if lines[start].trim_end() != FRONT_MATTER_FENCE {
            return Ok((None, start));
        }

        let end = lines[start + 1..]
            .iter()
            .position(|l| l.trim_end() == FRONT_MATTER_FENCE)
            .map(|offset| start + 1 + offset)
            .ok_or_else(|| Error::parse(start + 1, "unterminated front matter block"))?;

        let yaml = lines[start + 1..end]
            .iter()
            .map(|l| strip_comment(l))
            .collect::<Vec<_>>()
            .join("\n");

        Ok((Some(FrontMatter::from_yaml(&yaml)?), end + 1))
    }

    /// Split the body into raw cells at `# %%` markers.
    fn split_cells<'a>(&self, lines: &[&'a str], start: usize) -> Result<Vec<RawCell<'a>>> {
        let mut cells = Vec::new();
        let mut current: Option<RawCell<'a>> = None;
        let mut preamble: Vec<&'a str> = Vec::new();
        let mut preamble_line = 0;

        for (i, line) in lines.iter().enumerate().skip(start) {
            let line_no = i + 1;

            if let Some(rest) = marker_rest(line) {
                if let Some(cell) = current.take() {
                    cells.push(cell);
                } else if preamble.iter().any(|l| !l.trim().is_empty()) {
                    // Code written before the first marker is an implicit cell
                    cells.push(RawCell {
                        line: preamble_line,
                        kind: MarkerKind::Code,
                        title: None,
                        body: std::mem::take(&mut preamble),
                    });
                }

                let (kind, title) = self.parse_marker(rest, line_no)?;
                current = Some(RawCell {
                    line: line_no,
                    kind,
                    title,
                    body: Vec::new(),
                });
                continue;
            }

            match current.as_mut() {
                Some(cell) => cell.body.push(line),
                None => {
                    if preamble.is_empty() && !line.trim().is_empty() {
                        preamble_line = line_no;
                    }
                    if !preamble.is_empty() || !line.trim().is_empty() {
                        preamble.push(line);
                    }
                }
            }
        }

        match current {
            Some(cell) => cells.push(cell),
            None if preamble.iter().any(|l| !l.trim().is_empty()) => cells.push(RawCell {
                line: preamble_line,
                kind: MarkerKind::Code,
                title: None,
                body: preamble,
            }),
            None => {}
        }

        Ok(cells)
    }

    /// Parse what follows `# %%`: an optional `[type]` and an optional title.
    fn parse_marker(&self, rest: &str, line: usize) -> Result<(MarkerKind, Option<String>)> {
        let rest = rest.trim();
        let (kind, remainder) = if let Some(inner) = rest.strip_prefix('[') {
            let close = inner
                .find(']')
                .ok_or_else(|| Error::parse(line, "unclosed cell type bracket"))?;
            let cell_type = inner[..close].trim();
            match cell_type {
                "markdown" | "md" => (MarkerKind::Markdown, inner[close + 1..].trim()),
                "raw" => (MarkerKind::Raw, inner[close + 1..].trim()),
                other => {
                    return Err(Error::parse(line, format!("unknown cell type `[{other}]`")));
                }
            }
        } else {
            (MarkerKind::Code, rest)
        };

        // Jupytext writes cell metadata as `key=value` after the marker; it is not a title.
        let title = if remainder.is_empty() || remainder.contains('=') {
            None
        } else {
            Some(remainder.to_string())
        };

        Ok((kind, title))
    }

    /// Remove the `#` comment prefix from markdown lines.
    fn uncomment_markdown(&self, body: &[&str]) -> String {
        let lines: Vec<&str> = body.iter().map(|l| strip_comment(l)).collect();
        trim_blank_lines(&lines).join("\n")
    }

    /// Split leading `#| key: value` lines from the code.
    fn extract_directives(&self, body: &[&str], cell_line: usize) -> Result<(Directives, String)> {
        let mut directives = Directives::default();
        let mut code_start = 0;

        for (offset, line) in body.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() && code_start == offset {
                code_start = offset + 1;
                continue;
            }
            let Some(directive) = trimmed.strip_prefix(DIRECTIVE_PREFIX) else {
                break;
            };
            let line_no = cell_line + offset + 1;
            let (key, value) = directive
                .split_once(':')
                .ok_or_else(|| Error::parse(line_no, format!("directive without value: `{trimmed}`")))?;
            apply_directive(&mut directives, key.trim(), value.trim(), line_no)?;
            code_start = offset + 1;
        }

        let source = trim_blank_lines(&body[code_start..]).join("\n");
        Ok((directives, source))
    }
}

impl Default for PercentParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Text after a `# %%` marker, or `None` if the line is not a marker.
fn marker_rest(line: &str) -> Option<&str> {
    let trimmed = line.trim_end();
    trimmed
        .strip_prefix(MARKER)
        .or_else(|| trimmed.strip_prefix("#%%"))
        .filter(|rest| rest.is_empty() || rest.starts_with(' '))
}

/// Strip `# ` (or a bare `#`) from a commented line.
fn strip_comment(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("# ") {
        rest
    } else if let Some(rest) = line.strip_prefix('#') {
        rest
    } else {
        line
    }
}

fn trim_blank_lines<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(start);
    &lines[start..end]
}

fn apply_directive(directives: &mut Directives, key: &str, value: &str, line: usize) -> Result<()> {
    let flag = |value: &str| match value.to_ascii_lowercase().as_str() {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        _ => Err(Error::parse(
            line,
            format!("directive `{key}` expects true or false, got `{value}`"),
        )),
    };

    match key {
        "echo" => directives.echo = flag(value)?,
        "output" => directives.output = flag(value)?,
        "eval" => directives.eval = flag(value)?,
        "warning" => directives.warning = flag(value)?,
        "label" => directives.label = Some(value.to_string()),
        _ => {
            directives.extra.insert(key.to_string(), value.to_string());
        }
    }
    Ok(())
}
