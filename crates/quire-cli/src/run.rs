//! Run command implementation for Quire CLI.
//!
//! Executes a notebook top to bottom and prints each code cell's output.

use std::time::Instant;

use quire_core::script::ScriptConfig;

use crate::colors;
use crate::executor::NotebookExecutor;
use crate::output::print_output;

/// Execute a notebook.
pub fn execute(notebook_path: &str, config: ScriptConfig, json: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let executor = NotebookExecutor::new(notebook_path, config)?;

    if json {
        // Machine-readable: nothing but the outputs on stdout
        let execution = executor.execute_silent()?;
        println!("{}", serde_json::to_string_pretty(&execution.outputs)?);
        execution.into_result()?;
        return Ok(());
    }

    executor.print_header("Running");

    if executor.document.is_empty() {
        println!(
            "\n{}No cells found in notebook.{}",
            colors::YELLOW,
            colors::RESET
        );
        println!("Cells start with `# %%`; prose cells with `# %% [markdown]`");
        return Ok(());
    }

    let execution = executor.execute()?;

    println!("\n{}Outputs:{}", colors::BOLD, colors::RESET);
    println!("{}", "─".repeat(50));

    for (cell, output) in executor.document.cells.iter().zip(&execution.outputs) {
        print_output(cell, output);
    }

    let total_time = start.elapsed();
    println!("\n{}", "─".repeat(50));

    if execution.error.is_some() {
        println!(
            "{}Failed{} after {} of {} cells",
            colors::RED,
            colors::RESET,
            execution.outputs.len(),
            executor.document.len()
        );
    } else {
        println!(
            "{}Completed{} {} cells in {:.2}s (execution: {:.2}s)",
            colors::GREEN,
            colors::RESET,
            execution.outputs.len(),
            total_time.as_secs_f64(),
            execution.execution_time.as_secs_f64()
        );
    }

    execution.into_result()?;
    Ok(())
}
