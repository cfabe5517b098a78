//! Sync command implementation for Quire CLI.
//!
//! Converts percent notebooks to .ipynb format, optionally with outputs.

use std::path::Path;
use std::time::Instant;

use quire_core::script::ScriptConfig;
use quire_sync::{default_ipynb_path, sync_to_ipynb, write_ipynb};

use crate::colors;
use crate::executor::NotebookExecutor;
use crate::watch::{FileEvent, FileWatcher};

/// Execute the sync command.
pub fn execute(
    notebook_path: &str,
    config: ScriptConfig,
    run_cells: bool,
    watch: bool,
) -> anyhow::Result<()> {
    let path = Path::new(notebook_path);
    if !path.exists() {
        anyhow::bail!("Notebook not found: {}", notebook_path);
    }

    let abs_path = path.canonicalize()?;
    let ipynb_path = default_ipynb_path(&abs_path);

    println!(
        "\n{}Quire Sync{} - Converting to Jupyter format",
        colors::BOLD,
        colors::RESET
    );
    println!("{}", "─".repeat(50));

    if watch {
        println!(
            "{}Watching{} {} for changes...",
            colors::CYAN,
            colors::RESET,
            path.display()
        );
        println!("Press Ctrl+C to stop.\n");

        // A failing notebook should not stop the watcher
        if let Err(e) = sync_file(&abs_path, &ipynb_path, &config, run_cells) {
            eprintln!("  Error: {}", e);
        }
        watch_and_sync(&abs_path, &ipynb_path, &config, run_cells)?;
    } else {
        sync_file(&abs_path, &ipynb_path, &config, run_cells)?;
    }

    Ok(())
}

/// Sync a single file.
fn sync_file(
    source_path: &Path,
    ipynb_path: &Path,
    config: &ScriptConfig,
    run_cells: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();

    print!(
        "  {} → {} ... ",
        source_path.file_name().unwrap_or_default().to_string_lossy(),
        ipynb_path.file_name().unwrap_or_default().to_string_lossy()
    );
    colors::flush_stdout();

    if run_cells {
        let executor = NotebookExecutor::new(&source_path.to_string_lossy(), config.clone())?;
        let execution = executor.execute_silent()?;
        // Partial outputs are still written so the failing cell shows its error
        write_ipynb(&executor.document, Some(&execution.outputs), ipynb_path)?;
        if execution.error.is_some() {
            println!("{}✗{}", colors::RED, colors::RESET);
            execution.into_result()?;
            return Ok(());
        }
    } else {
        sync_to_ipynb(source_path, ipynb_path, None)?;
    }

    let elapsed = start.elapsed();
    println!(
        "{}✓{} ({:.2}ms)",
        colors::GREEN,
        colors::RESET,
        elapsed.as_secs_f64() * 1000.0
    );

    Ok(())
}

/// Watch a file and sync on changes.
fn watch_and_sync(
    source_path: &Path,
    ipynb_path: &Path,
    config: &ScriptConfig,
    run_cells: bool,
) -> anyhow::Result<()> {
    let watcher = FileWatcher::new(source_path)?;

    while let Some(event) = watcher.recv() {
        match event {
            FileEvent::Modified(_) => {
                println!(
                    "\n{}File changed, syncing...{}",
                    colors::YELLOW,
                    colors::RESET
                );
                if let Err(e) = sync_file(source_path, ipynb_path, config, run_cells) {
                    eprintln!("  Error: {}", e);
                }
            }
            FileEvent::Removed(path) => {
                eprintln!(
                    "\n{}Warning:{} Notebook file removed: {}",
                    colors::YELLOW,
                    colors::RESET,
                    path.display()
                );
            }
        }
    }

    Ok(())
}
