//! Shared notebook execution pipeline for Quire CLI.
//!
//! Used by `run`, `render` and `sync --execute`: parse the notebook, run
//! every cell in order, and hand back whatever outputs were produced, even
//! when a cell failed.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use quire_core::document::{CellId, Document, PercentParser};
use quire_core::execute::{CellRunner, ExecutionCallback, ExecutionContext, Kernel};
use quire_core::script::{ScriptConfig, ScriptKernel};
use quire_core::state::CellOutput;
use quire_core::Error;

use crate::colors;

/// Progress callback that prints execution status to the terminal.
#[derive(Default)]
pub struct ProgressCallback;

impl ProgressCallback {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionCallback for ProgressCallback {
    fn on_cell_started(&self, _cell_id: CellId, name: &str) {
        print!(
            "{}  ▶ Running{} {}{}{}... ",
            colors::CYAN,
            colors::RESET,
            colors::BOLD,
            name,
            colors::RESET
        );
        colors::flush_stdout();
    }

    fn on_cell_completed(&self, _cell_id: CellId, _name: &str) {
        println!("{}✓{}", colors::GREEN, colors::RESET);
    }

    fn on_cell_error(&self, _cell_id: CellId, name: &str, error: &Error) {
        println!("{}✗{}", colors::RED, colors::RESET);
        eprintln!("{}    Error in {}:{} {}", colors::RED, name, colors::RESET, error);
    }

    fn on_cell_skipped(&self, _cell_id: CellId, name: &str) {
        println!(
            "{}  ○ Skipped {} (eval: false){}",
            colors::DIM,
            name,
            colors::RESET
        );
    }
}

/// Result of running a notebook.
pub struct ExecutionInfo {
    /// One output per processed cell; shorter than the document if the run halted.
    pub outputs: Vec<CellOutput>,
    /// The error that halted the run, if any.
    pub error: Option<Error>,
    /// Wall time spent in the runner.
    pub execution_time: Duration,
    /// Language of the kernel that ran the code cells.
    pub language: String,
}

impl ExecutionInfo {
    /// Turn a halted run into an error for the caller.
    pub fn into_result(self) -> anyhow::Result<Vec<CellOutput>> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self.outputs),
        }
    }
}

/// Notebook executor that manages the parse and run pipeline.
pub struct NotebookExecutor {
    /// Absolute path to the notebook file.
    pub notebook_path: PathBuf,
    /// Parsed document.
    pub document: Document,
    /// Kernel configuration.
    pub config: ScriptConfig,
}

impl NotebookExecutor {
    /// Parse the notebook at `notebook_path`.
    pub fn new(notebook_path: &str, config: ScriptConfig) -> anyhow::Result<Self> {
        let path = Path::new(notebook_path);
        if !path.exists() {
            anyhow::bail!("Notebook not found: {}", notebook_path);
        }

        let notebook_path = path.canonicalize()?;
        let document = PercentParser::new().parse_file(&notebook_path)?;

        Ok(Self {
            notebook_path,
            document,
            config,
        })
    }

    /// Get the notebook file name.
    pub fn notebook_name(&self) -> String {
        self.notebook_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// Print a header for the given action.
    pub fn print_header(&self, action: &str) {
        println!(
            "\n{}Quire{} - {} {}",
            colors::BOLD,
            colors::RESET,
            action,
            self.notebook_name()
        );
        if let Some(title) = self.document.title() {
            println!("{}{}{}", colors::DIM, title, colors::RESET);
        }
        println!("{}", "─".repeat(50));
        println!(
            "  {} cells ({} code)",
            self.document.len(),
            self.document.code_cells().count()
        );
    }

    /// Run every cell, printing progress as it goes.
    pub fn execute(&self) -> anyhow::Result<ExecutionInfo> {
        self.run(Some(ProgressCallback::new()))
    }

    /// Run every cell without progress output.
    pub fn execute_silent(&self) -> anyhow::Result<ExecutionInfo> {
        self.run(None)
    }

    fn run(&self, callback: Option<ProgressCallback>) -> anyhow::Result<ExecutionInfo> {
        let mut runner = CellRunner::new(ScriptKernel::new(self.config.clone()));
        if let Some(callback) = callback {
            runner.set_callback(callback);
        }
        let language = runner.kernel().language().to_string();

        let mut ctx = ExecutionContext::new();
        let start = Instant::now();
        let result = runner.run(&self.document, &mut ctx);
        let execution_time = start.elapsed();

        tracing::debug!("Run finished: {} ({} names bound)", runner.state(), ctx.len());

        match result {
            Ok(outputs) => Ok(ExecutionInfo {
                outputs,
                error: None,
                execution_time,
                language,
            }),
            Err(Error::CellExecution(failure)) => Ok(ExecutionInfo {
                outputs: failure.outputs.clone(),
                error: Some(Error::CellExecution(failure)),
                execution_time,
                language,
            }),
            Err(err) => Err(err.into()),
        }
    }
}
