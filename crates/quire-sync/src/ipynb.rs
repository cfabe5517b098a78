//! Jupyter notebook (.ipynb) generation and import.
//!
//! Converts Quire documents, optionally with run outputs, to nbformat 4.5
//! and back.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use quire_core::document::{Cell, CellKind, Document, FrontMatter, PercentParser};
use quire_core::state::{self, OutputItem};

use crate::error::{SyncError, SyncResult};

/// A Jupyter notebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupyterNotebook {
    /// Notebook metadata
    pub metadata: JupyterMetadata,

    /// Format version (always 4)
    pub nbformat: u32,

    /// Minor format version
    pub nbformat_minor: u32,

    /// Notebook cells
    pub cells: Vec<JupyterCell>,
}

/// Jupyter notebook metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupyterMetadata {
    /// Kernel specification
    pub kernelspec: KernelSpec,

    /// Language info
    pub language_info: LanguageInfo,

    /// Quire-specific metadata for round-trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quire: Option<QuireMetadata>,
}

/// Kernel specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSpec {
    pub display_name: String,
    pub language: String,
    pub name: String,
}

/// Language information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

/// Quire-specific metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuireMetadata {
    /// Quire version that wrote the file
    pub version: String,

    /// Front matter of the source notebook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_matter: Option<serde_json::Value>,
}

/// A Jupyter cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupyterCell {
    /// Cell type
    pub cell_type: String,

    /// Cell metadata
    #[serde(default)]
    pub metadata: CellMetadata,

    /// Cell source (lines)
    #[serde(deserialize_with = "multiline::deserialize")]
    pub source: Vec<String>,

    /// Cell outputs (for code cells)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<CellOutput>>,

    /// Execution count (for code cells)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<u32>,
}

/// Cell metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellMetadata {
    /// Title written after the cell marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Cell output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type")]
pub enum CellOutput {
    /// Standard output/error
    #[serde(rename = "stream")]
    Stream {
        name: String,
        #[serde(deserialize_with = "multiline::deserialize")]
        text: Vec<String>,
    },

    /// Display data
    #[serde(rename = "display_data")]
    DisplayData {
        data: OutputData,
        #[serde(default)]
        metadata: serde_json::Value,
    },

    /// Value of the last expression (read from foreign notebooks only)
    #[serde(rename = "execute_result")]
    ExecuteResult {
        execution_count: Option<u32>,
        data: OutputData,
        #[serde(default)]
        metadata: serde_json::Value,
    },

    /// Error output
    #[serde(rename = "error")]
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
}

/// Output data with multiple representations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    /// Plain text
    #[serde(
        rename = "text/plain",
        default,
        deserialize_with = "multiline::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub text_plain: Option<Vec<String>>,

    /// SVG image
    #[serde(
        rename = "image/svg+xml",
        default,
        deserialize_with = "multiline::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_svg: Option<Vec<String>>,
}

/// nbformat allows multiline strings as either one string or a list of lines.
mod multiline {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Multiline {
        One(String),
        Many(Vec<String>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Multiline::deserialize(deserializer)? {
            Multiline::One(text) => super::split_lines(&text),
            Multiline::Many(lines) => lines,
        })
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<String>>, D::Error> {
        deserialize(deserializer).map(Some)
    }
}

/// Split text into nbformat lines: every line keeps its `\n` except the last.
fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

impl JupyterNotebook {
    /// Create a new empty notebook.
    pub fn new() -> Self {
        Self {
            metadata: JupyterMetadata::default(),
            nbformat: 4,
            nbformat_minor: 5,
            cells: Vec::new(),
        }
    }

    /// Write the notebook to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> SyncResult<()> {
        let path = path.as_ref();
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json).map_err(|e| SyncError::WriteError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Read a notebook from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SyncError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let notebook: Self = serde_json::from_str(&content)?;
        if notebook.nbformat < 4 {
            return Err(SyncError::InvalidNotebook(format!(
                "nbformat {} is not supported (need 4 or later)",
                notebook.nbformat
            )));
        }
        Ok(notebook)
    }

    /// Convert back to a document. Outputs are dropped.
    pub fn to_document(&self) -> SyncResult<Document> {
        let front_matter = match self
            .metadata
            .quire
            .as_ref()
            .and_then(|q| q.front_matter.clone())
        {
            Some(value) => Some(serde_json::from_value::<FrontMatter>(value)?),
            None => None,
        };

        let parser = PercentParser::new();
        let mut cells = Vec::with_capacity(self.cells.len());
        for (index, jupyter_cell) in self.cells.iter().enumerate() {
            let text: String = jupyter_cell.source.concat();
            let mut cell = match jupyter_cell.cell_type.as_str() {
                "markdown" => Cell::markdown(index, text.trim_end()),
                "code" => {
                    // Reuse the percent parser for `#|` directive lines
                    let parsed = parser.parse_source(&format!("# %%\n{text}\n"))?;
                    parsed
                        .cells
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| Cell::code(index, ""))
                }
                "raw" => {
                    tracing::warn!("Skipping raw cell {}", index);
                    continue;
                }
                other => {
                    return Err(SyncError::InvalidNotebook(format!(
                        "unknown cell type '{other}' in cell {index}"
                    )));
                }
            };
            cell.title = jupyter_cell.metadata.title.clone();
            cells.push(cell);
        }

        let mut document = Document::from_cells(cells);
        document.front_matter = front_matter;
        Ok(document)
    }
}

impl Default for JupyterNotebook {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for JupyterMetadata {
    fn default() -> Self {
        Self {
            kernelspec: KernelSpec {
                display_name: "Python 3 (ipykernel)".to_string(),
                language: "python".to_string(),
                name: "python3".to_string(),
            },
            language_info: LanguageInfo {
                name: "python".to_string(),
                file_extension: Some(".py".to_string()),
                mimetype: Some("text/x-python".to_string()),
            },
            quire: Some(QuireMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                front_matter: None,
            }),
        }
    }
}

/// Generator for Jupyter notebooks from Quire documents.
#[derive(Debug, Default)]
pub struct IpynbGenerator;

impl IpynbGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a Jupyter notebook from a document.
    ///
    /// When `outputs` is given it must come from a run of the same document;
    /// cells past the end of a failed run get no outputs.
    pub fn generate(
        &self,
        document: &Document,
        outputs: Option<&[state::CellOutput]>,
    ) -> SyncResult<JupyterNotebook> {
        let mut notebook = JupyterNotebook::new();

        if let Some(front_matter) = &document.front_matter {
            if let Some(spec) = front_matter.kernelspec() {
                notebook.metadata.kernelspec = KernelSpec {
                    display_name: spec.display_name,
                    language: spec.language.clone(),
                    name: spec.name,
                };
                notebook.metadata.language_info.name = spec.language;
            }
            if let Some(quire) = notebook.metadata.quire.as_mut() {
                quire.front_matter = Some(serde_json::to_value(front_matter)?);
            }
        }

        for (index, cell) in document.cells.iter().enumerate() {
            let output = outputs.and_then(|o| o.get(index));
            notebook.cells.push(self.convert_cell(cell, output, outputs.is_some()));
        }

        Ok(notebook)
    }

    /// Convert a cell, attaching its run output if any.
    fn convert_cell(
        &self,
        cell: &Cell,
        output: Option<&state::CellOutput>,
        executed: bool,
    ) -> JupyterCell {
        match &cell.kind {
            CellKind::Markdown { text } => JupyterCell {
                cell_type: "markdown".to_string(),
                metadata: CellMetadata {
                    title: cell.title.clone(),
                    tags: None,
                },
                source: split_lines(text),
                outputs: None,
                execution_count: None,
            },
            CellKind::Code { source, directives } => {
                let mut tags = Vec::new();
                if !directives.echo {
                    tags.push("remove-input".to_string());
                }
                if !directives.output {
                    tags.push("remove-output".to_string());
                }
                if !directives.eval {
                    tags.push("skip-execution".to_string());
                }

                let mut text = directives.to_lines().join("\n");
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(source);

                let (outputs, execution_count) = match output {
                    Some(state::CellOutput::Code {
                        items,
                        execution_count,
                        ..
                    }) => (items.iter().map(convert_item).collect(), *execution_count),
                    _ => (Vec::new(), None),
                };
                if executed && output.is_none() {
                    tracing::debug!("Cell {} has no output (run stopped earlier)", cell.id);
                }

                JupyterCell {
                    cell_type: "code".to_string(),
                    metadata: CellMetadata {
                        title: cell.title.clone(),
                        tags: (!tags.is_empty()).then_some(tags),
                    },
                    source: split_lines(&text),
                    outputs: Some(outputs),
                    execution_count,
                }
            }
        }
    }
}

fn convert_item(item: &OutputItem) -> CellOutput {
    match item {
        OutputItem::Stream { name, text } => CellOutput::Stream {
            name: name.as_str().to_string(),
            text: split_lines(text),
        },
        OutputItem::Figure(figure) => CellOutput::DisplayData {
            data: OutputData {
                text_plain: Some(vec![format!("<Figure {}: {}>", figure.id, figure.label)]),
                image_svg: Some(split_lines(&figure.data)),
            },
            metadata: serde_json::json!({}),
        },
        OutputItem::Error {
            kind,
            message,
            line,
        } => {
            let mut traceback = Vec::new();
            if let Some(line) = line {
                traceback.push(format!("Cell line {line}"));
            }
            traceback.push(format!("{kind}: {message}"));
            CellOutput::Error {
                ename: kind.clone(),
                evalue: message.clone(),
                traceback,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::document::Directives;
    use quire_core::state::{FigureArtifact, StreamName};

    #[test]
    fn test_empty_notebook() {
        let notebook = JupyterNotebook::new();
        assert_eq!(notebook.nbformat, 4);
        assert!(notebook.cells.is_empty());
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb"), vec!["a\n", "b"]);
        assert_eq!(split_lines("a\n"), vec!["a\n"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_generate_markdown_cell() {
        let cell = Cell::markdown(0, "# Hello\n\nThis is a test.");
        let jupyter_cell = IpynbGenerator::new().convert_cell(&cell, None, false);

        assert_eq!(jupyter_cell.cell_type, "markdown");
        assert_eq!(jupyter_cell.source.len(), 3);
        assert!(jupyter_cell.outputs.is_none());
    }

    #[test]
    fn test_directives_become_tags_and_source_lines() {
        let directives = Directives {
            echo: false,
            output: false,
            ..Directives::default()
        };
        let cell = Cell::code_with(0, "import warnings", directives);
        let jupyter_cell = IpynbGenerator::new().convert_cell(&cell, None, false);

        assert_eq!(
            jupyter_cell.metadata.tags,
            Some(vec!["remove-input".to_string(), "remove-output".to_string()])
        );
        assert_eq!(jupyter_cell.source[0], "#| echo: false\n");
        assert_eq!(jupyter_cell.source.last().map(String::as_str), Some("import warnings"));
        assert_eq!(jupyter_cell.execution_count, None);
    }

    #[test]
    fn test_outputs_are_converted() {
        let cell = Cell::code(0, "print(1)");
        let output = state::CellOutput::Code {
            source: Some("print(1)".to_string()),
            items: vec![
                OutputItem::Stream {
                    name: StreamName::Stdout,
                    text: "1\n".to_string(),
                },
                OutputItem::Figure(FigureArtifact {
                    id: 1,
                    label: "plt.plot".to_string(),
                    calls: vec![],
                    mime: "image/svg+xml".to_string(),
                    data: "<svg>\n</svg>\n".to_string(),
                }),
            ],
            execution_count: Some(3),
        };
        let jupyter_cell = IpynbGenerator::new().convert_cell(&cell, Some(&output), true);

        assert_eq!(jupyter_cell.execution_count, Some(3));
        let outputs = jupyter_cell.outputs.unwrap();
        assert_eq!(
            outputs[0],
            CellOutput::Stream {
                name: "stdout".to_string(),
                text: vec!["1\n".to_string()]
            }
        );
        let CellOutput::DisplayData { data, .. } = &outputs[1] else {
            panic!("expected display data");
        };
        assert_eq!(
            data.image_svg,
            Some(vec!["<svg>\n".to_string(), "</svg>\n".to_string()])
        );
    }

    #[test]
    fn test_source_may_be_a_single_string() {
        let json = r##"{
            "cell_type": "code",
            "metadata": {},
            "source": "x = 1\nprint(x)",
            "outputs": [{"output_type": "stream", "name": "stdout", "text": "1\n"}],
            "execution_count": 1
        }"##;
        let cell: JupyterCell = serde_json::from_str(json).unwrap();
        assert_eq!(cell.source, vec!["x = 1\n", "print(x)"]);
    }

    #[test]
    fn test_execute_result_is_readable() {
        let json = r#"{
            "output_type": "execute_result",
            "execution_count": 4,
            "data": {"text/plain": "5", "image/png": "iVBOR"},
            "metadata": {}
        }"#;
        let output: CellOutput = serde_json::from_str(json).unwrap();
        let CellOutput::ExecuteResult { data, .. } = output else {
            panic!("expected execute_result");
        };
        assert_eq!(data.text_plain, Some(vec!["5".to_string()]));
    }

    #[test]
    fn test_notebook_serialization() {
        let notebook = JupyterNotebook::new();
        let json = serde_json::to_string_pretty(&notebook).unwrap();

        assert!(json.contains("nbformat"));
        assert!(json.contains("\"kernelspec\""));
        assert!(json.contains("cells"));
    }
}
