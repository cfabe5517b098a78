//! Rendering of run outputs.
//!
//! [`render_blocks`] flattens per-cell outputs into the ordered stream a
//! reader sees: prose, echoed source, printed text, figures and errors.
//! [`to_markdown`] turns that stream into a Markdown page. Figures are either
//! referenced as SVG files, which [`write_figures`] puts on disk, or embedded
//! as data URIs.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;

use crate::document::FrontMatter;
use crate::error::Result;
use crate::state::{CellOutput, FigureArtifact, OutputItem, StreamName};

/// One displayable unit of a rendered run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedBlock {
    Prose(String),
    Source { language: String, code: String },
    Stdout(String),
    Stderr(String),
    Figure(FigureArtifact),
    Error {
        kind: String,
        message: String,
        line: Option<usize>,
    },
}

/// Flatten outputs into display order.
///
/// `language` tags echoed source blocks.
pub fn render_blocks(outputs: &[CellOutput], language: &str) -> Vec<RenderedBlock> {
    let mut blocks = Vec::new();
    for output in outputs {
        match output {
            CellOutput::Prose { text } => {
                if !text.trim().is_empty() {
                    blocks.push(RenderedBlock::Prose(text.clone()));
                }
            }
            CellOutput::Code { source, items, .. } => {
                if let Some(code) = source.as_ref().filter(|s| !s.trim().is_empty()) {
                    blocks.push(RenderedBlock::Source {
                        language: language.to_string(),
                        code: code.clone(),
                    });
                }
                blocks.extend(items.iter().map(|item| match item {
                    OutputItem::Stream {
                        name: StreamName::Stdout,
                        text,
                    } => RenderedBlock::Stdout(text.clone()),
                    OutputItem::Stream {
                        name: StreamName::Stderr,
                        text,
                    } => RenderedBlock::Stderr(text.clone()),
                    OutputItem::Figure(figure) => RenderedBlock::Figure(figure.clone()),
                    OutputItem::Error {
                        kind,
                        message,
                        line,
                    } => RenderedBlock::Error {
                        kind: kind.clone(),
                        message: message.clone(),
                        line: *line,
                    },
                }));
            }
        }
    }
    blocks
}

/// How figures are referenced from rendered Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureRefs<'a> {
    /// Link to [`FigureArtifact::file_name`] inside this directory.
    Directory(&'a str),
    /// Embed the figure as a base64 data URI.
    Inline,
}

impl FigureRefs<'_> {
    fn target(&self, figure: &FigureArtifact) -> String {
        match self {
            Self::Directory(dir) => {
                let prefix = dir.trim_end_matches('/');
                if prefix.is_empty() {
                    figure.file_name()
                } else {
                    format!("{prefix}/{}", figure.file_name())
                }
            }
            Self::Inline => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&figure.data);
                format!("data:{};base64,{encoded}", figure.mime)
            }
        }
    }
}

/// Render blocks as Markdown, with an optional YAML header.
pub fn to_markdown(
    blocks: &[RenderedBlock],
    front_matter: Option<&FrontMatter>,
    figures: FigureRefs<'_>,
) -> Result<String> {
    let mut out = String::new();

    if let Some(front_matter) = front_matter {
        out.push_str("---\n");
        out.push_str(&front_matter.to_yaml()?);
        out.push_str("---\n\n");
    }

    let sections: Vec<String> = blocks
        .iter()
        .map(|block| match block {
            RenderedBlock::Prose(text) => text.trim_end().to_string(),
            RenderedBlock::Source { language, code } => fence(language, code),
            RenderedBlock::Stdout(text) => fence("", text),
            RenderedBlock::Stderr(text) => fence("stderr", text),
            RenderedBlock::Figure(figure) => {
                format!("![{}]({})", figure.label, figures.target(figure))
            }
            RenderedBlock::Error {
                kind,
                message,
                line,
            } => {
                let location = line.map(|l| format!(" (line {l})")).unwrap_or_default();
                fence("error", &format!("{kind}: {message}{location}"))
            }
        })
        .collect();

    out.push_str(&sections.join("\n\n"));
    out.push('\n');
    Ok(out)
}

fn fence(info: &str, body: &str) -> String {
    let body = body.trim_end_matches('\n');
    // Use a longer fence if the body contains one
    let ticks = if body.contains("```") { "````" } else { "```" };
    format!("{ticks}{info}\n{body}\n{ticks}")
}

/// Write every figure in `outputs` to `dir` as an SVG file.
///
/// Returns the written paths in figure order.
pub fn write_figures(outputs: &[CellOutput], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for figure in outputs.iter().flat_map(CellOutput::figures) {
        if written.is_empty() {
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(figure.file_name());
        fs::write(&path, &figure.data)?;
        tracing::debug!("Wrote figure {} to {}", figure.id, path.display());
        written.push(path);
    }
    Ok(written)
}
