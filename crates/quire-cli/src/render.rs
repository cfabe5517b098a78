//! Render command implementation for Quire CLI.
//!
//! Runs a notebook and writes the result as a Markdown page. A failed run
//! is still rendered up to and including the failing cell before the
//! command reports the error.

use std::fs;
use std::path::{Path, PathBuf};

use quire_core::script::ScriptConfig;
use quire_core::{FigureRefs, render_blocks, to_markdown, write_figures};

use crate::colors;
use crate::executor::NotebookExecutor;

/// Options for `quire render`.
pub struct RenderOptions {
    pub output: Option<String>,
    pub figures: Option<String>,
    pub embed_figures: bool,
}

/// Execute the render command.
pub fn execute(
    notebook_path: &str,
    config: ScriptConfig,
    options: &RenderOptions,
) -> anyhow::Result<()> {
    let executor = NotebookExecutor::new(notebook_path, config)?;
    executor.print_header("Rendering");

    let output_path = options
        .output
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| executor.notebook_path.with_extension("md"));
    let output_dir = output_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let execution = executor.execute()?;

    let language = executor
        .document
        .front_matter
        .as_ref()
        .and_then(|fm| fm.kernelspec())
        .map(|spec| spec.language)
        .unwrap_or_else(|| execution.language.clone());
    let blocks = render_blocks(&execution.outputs, &language);

    let markdown = if options.embed_figures {
        to_markdown(&blocks, executor.document.front_matter.as_ref(), FigureRefs::Inline)?
    } else {
        let figure_dir = options
            .figures
            .clone()
            .unwrap_or_else(|| default_figure_dir(&output_path));
        let written = write_figures(&execution.outputs, &output_dir.join(&figure_dir))?;
        if !written.is_empty() {
            println!(
                "  {}{} figure(s) → {}{}",
                colors::DIM,
                written.len(),
                figure_dir,
                colors::RESET
            );
        }
        to_markdown(
            &blocks,
            executor.document.front_matter.as_ref(),
            FigureRefs::Directory(&figure_dir),
        )?
    };

    fs::write(&output_path, markdown)?;
    println!(
        "{}✓{} Wrote {}",
        colors::GREEN,
        colors::RESET,
        output_path.display()
    );

    execution.into_result()?;
    Ok(())
}

/// `post.md` → `post_files`.
fn default_figure_dir(output_path: &Path) -> String {
    let stem = output_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    format!("{stem}_files")
}
