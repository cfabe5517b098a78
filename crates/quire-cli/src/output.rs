//! Output formatting for terminal display.

use quire_core::document::Cell;
use quire_core::state::{CellOutput, OutputItem, StreamName};

use crate::colors;

/// Print a code cell's captured output. Prose cells print nothing.
pub fn print_output(cell: &Cell, output: &CellOutput) {
    let CellOutput::Code {
        items,
        execution_count,
        ..
    } = output
    else {
        return;
    };

    let count = execution_count
        .map(|n| format!("[{n}]"))
        .unwrap_or_else(|| "[ ]".to_string());
    println!(
        "\n{}{}{} {}{}{}",
        colors::DIM,
        count,
        colors::RESET,
        colors::CYAN,
        cell.display_name(),
        colors::RESET
    );

    if items.is_empty() {
        println!("  {}(no output){}", colors::DIM, colors::RESET);
        return;
    }

    for item in items {
        match item {
            OutputItem::Stream {
                name: StreamName::Stdout,
                text,
            } => print_indented(text, "", ""),
            OutputItem::Stream {
                name: StreamName::Stderr,
                text,
            } => print_indented(text, colors::YELLOW, colors::RESET),
            OutputItem::Figure(figure) => {
                println!(
                    "  {}[figure {}: {}]{} {}",
                    colors::GREEN,
                    figure.id,
                    figure.label,
                    colors::RESET,
                    figure.calls.join(", ")
                );
            }
            OutputItem::Error {
                kind,
                message,
                line,
            } => {
                let location = line.map(|l| format!(" (line {l})")).unwrap_or_default();
                println!(
                    "  {}{}: {}{}{}",
                    colors::RED,
                    kind,
                    message,
                    location,
                    colors::RESET
                );
            }
        }
    }
}

fn print_indented(text: &str, start: &str, end: &str) {
    for line in text.lines() {
        println!("  {start}{line}{end}");
    }
}
