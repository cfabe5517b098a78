//! Debounced notebook watching for `quire sync --watch`.
//!
//! The notebook's directory is watched rather than the file, so editors that
//! save by writing a temporary file and renaming it are still picked up.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use notify_debouncer_mini::notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};

/// Quiet period before a burst of writes is reported as one change.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// A change to the watched notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Modified(PathBuf),
    Removed(PathBuf),
}

/// Watches a single notebook file.
pub struct FileWatcher {
    /// Dropping the debouncer stops the watch.
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    rx: mpsc::Receiver<FileEvent>,
}

impl FileWatcher {
    /// Start watching `path`, which should be canonical so event paths compare equal.
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let target = path.to_path_buf();
        let watch_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let (tx, rx) = mpsc::channel();

        let mut debouncer = new_debouncer(DEBOUNCE, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        if let Some(file_event) = classify(&event.path, &target) {
                            let _ = tx.send(file_event);
                        }
                    }
                }
                Err(e) => tracing::warn!("File watch error: {}", e),
            }
        })
        .context("Failed to create file watcher")?;

        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", watch_dir.display()))?;
        tracing::debug!("Watching {}", watch_dir.display());

        Ok(Self {
            _debouncer: debouncer,
            rx,
        })
    }

    /// Block until the notebook changes. `None` once the watcher has shut down.
    pub fn recv(&self) -> Option<FileEvent> {
        self.rx.recv().ok()
    }
}

/// Map a debounced event in the watched directory to a notebook event.
fn classify(event_path: &Path, target: &Path) -> Option<FileEvent> {
    if event_path != target {
        return None;
    }
    Some(if event_path.exists() {
        FileEvent::Modified(event_path.to_path_buf())
    } else {
        FileEvent::Removed(event_path.to_path_buf())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_watcher_creation() {
        let temp = TempDir::new().unwrap();
        let notebook = temp.path().join("post.py");
        fs::write(&notebook, "# %%\nx = 1\n").unwrap();

        let watcher = FileWatcher::new(&notebook.canonicalize().unwrap());
        assert!(watcher.is_ok());
    }

    #[test]
    fn test_classify_filters_other_files() {
        let temp = TempDir::new().unwrap();
        let notebook = temp.path().join("post.py");
        let ipynb = temp.path().join("post.ipynb");
        fs::write(&notebook, "# %%\n").unwrap();
        fs::write(&ipynb, "{}").unwrap();

        // Writing the .ipynb next to the notebook must not retrigger a sync
        assert_eq!(classify(&ipynb, &notebook), None);
        assert_eq!(
            classify(&notebook, &notebook),
            Some(FileEvent::Modified(notebook.clone()))
        );

        fs::remove_file(&notebook).unwrap();
        assert_eq!(
            classify(&notebook, &notebook),
            Some(FileEvent::Removed(notebook.clone()))
        );
    }
}
