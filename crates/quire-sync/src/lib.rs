//! Sync engine for Quire notebooks.
//!
//! Converts between percent-format notebooks and `.ipynb` Jupyter format.
//!
//! # Architecture
//!
//! ```text
//! post.py ─────► PercentParser ─────► Document ─────► IpynbGenerator ─────► post.ipynb
//!                                        │                  ▲
//!                                        ▼                  │
//!                                    CellRunner ─── outputs ┘
//!                                     (optional)
//!
//! post.ipynb ───► JupyterNotebook::to_document ───► PercentWriter ───► post.py
//! ```

mod error;
mod ipynb;

pub use error::{SyncError, SyncResult};
pub use ipynb::{
    CellMetadata, CellOutput, IpynbGenerator, JupyterCell, JupyterMetadata, JupyterNotebook,
    KernelSpec, LanguageInfo, OutputData, QuireMetadata,
};

use std::fs;
use std::path::{Path, PathBuf};

use quire_core::document::{Document, PercentParser, PercentWriter};
use quire_core::state;

/// Sync a percent notebook to `.ipynb` format.
///
/// `outputs`, when given, must come from a run of the notebook at `source_path`.
pub fn sync_to_ipynb(
    source_path: impl AsRef<Path>,
    ipynb_path: impl AsRef<Path>,
    outputs: Option<&[state::CellOutput]>,
) -> SyncResult<()> {
    let source_path = source_path.as_ref();
    let ipynb_path = ipynb_path.as_ref();

    let document = PercentParser::new().parse_file(source_path)?;
    write_ipynb(&document, outputs, ipynb_path)?;

    tracing::info!(
        "Synced {} → {} ({} cells)",
        source_path.display(),
        ipynb_path.display(),
        document.len()
    );

    Ok(())
}

/// Write an already parsed document (and optional outputs) as `.ipynb`.
pub fn write_ipynb(
    document: &Document,
    outputs: Option<&[state::CellOutput]>,
    ipynb_path: impl AsRef<Path>,
) -> SyncResult<()> {
    let notebook = IpynbGenerator::new().generate(document, outputs)?;
    notebook.write_to_file(ipynb_path)
}

/// Convert a `.ipynb` notebook back to percent format.
pub fn sync_from_ipynb(
    ipynb_path: impl AsRef<Path>,
    source_path: impl AsRef<Path>,
) -> SyncResult<()> {
    let ipynb_path = ipynb_path.as_ref();
    let source_path = source_path.as_ref();

    let document = JupyterNotebook::read_from_file(ipynb_path)?.to_document()?;
    let text = PercentWriter::new().write(&document)?;
    fs::write(source_path, text).map_err(|e| SyncError::WriteError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })?;

    tracing::info!(
        "Synced {} → {} ({} cells)",
        ipynb_path.display(),
        source_path.display(),
        document.len()
    );

    Ok(())
}

/// Get the default `.ipynb` path for a percent notebook.
pub fn default_ipynb_path(source_path: impl AsRef<Path>) -> PathBuf {
    source_path.as_ref().with_extension("ipynb")
}
