//! ANSI styles for `quire` progress lines and cell output blocks.
//!
//! A run prints one progress line per cell (`▶ Running <cell>... ✓`), then
//! each cell's captured output under an `[n] <cell>` heading.

use std::io::{self, Write};

pub const RESET: &str = "\x1b[0m";
/// Section headings such as `Outputs:` and the running cell's name.
pub const BOLD: &str = "\x1b[1m";
/// Execution counts, skipped `eval: false` cells and `(no output)`.
pub const DIM: &str = "\x1b[2m";
/// The `✓` marker, `Completed` summaries and figure placeholders.
pub const GREEN: &str = "\x1b[32m";
/// Captured stderr (warnings) and watch notices.
pub const YELLOW: &str = "\x1b[33m";
/// `▶ Running` and cell headings.
pub const CYAN: &str = "\x1b[36m";
/// The `✗` marker and the failing cell's error item.
pub const RED: &str = "\x1b[31m";

/// Push out a progress line left open until its cell finishes.
#[inline]
pub fn flush_stdout() {
    io::stdout().flush().ok();
}
