//! Side-effect capture for a single cell.

use crate::state::{FigureArtifact, OutputItem, StreamName};

/// Collects the side effects of one cell in the order they happen.
///
/// Consecutive writes to the same stream are merged into one item, so a
/// loop of `print` calls yields a single text block.
#[derive(Debug, Default)]
pub struct OutputCapture {
    items: Vec<OutputItem>,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text to a stream.
    pub fn write(&mut self, name: StreamName, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(OutputItem::Stream {
            name: last,
            text: buffer,
        }) = self.items.last_mut()
            && *last == name
        {
            buffer.push_str(text);
            return;
        }
        self.items.push(OutputItem::Stream {
            name,
            text: text.to_string(),
        });
    }

    pub fn stdout(&mut self, text: &str) {
        self.write(StreamName::Stdout, text);
    }

    pub fn stderr(&mut self, text: &str) {
        self.write(StreamName::Stderr, text);
    }

    pub fn figure(&mut self, figure: FigureArtifact) {
        self.items.push(OutputItem::Figure(figure));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[OutputItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<OutputItem> {
        self.items
    }
}
