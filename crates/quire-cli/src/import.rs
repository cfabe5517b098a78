//! Import command implementation for Quire CLI.
//!
//! Converts a Jupyter notebook to percent format. Outputs are not kept.

use std::path::{Path, PathBuf};

use quire_sync::sync_from_ipynb;

use crate::colors;

/// Execute the import command.
pub fn execute(ipynb_path: &str, output: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = Path::new(ipynb_path);
    if !path.exists() {
        anyhow::bail!("Notebook not found: {}", ipynb_path);
    }

    let target = output
        .map(PathBuf::from)
        .unwrap_or_else(|| path.with_extension("py"));
    if target.exists() && !force {
        anyhow::bail!(
            "File {} already exists (use --force to overwrite)",
            target.display()
        );
    }

    sync_from_ipynb(path, &target)?;
    println!(
        "{}✓{} Wrote {}",
        colors::GREEN,
        colors::RESET,
        target.display()
    );

    Ok(())
}
