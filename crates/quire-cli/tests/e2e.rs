//! End-to-end tests for Quire CLI commands.
//!
//! These tests run the `quire` binary against real notebook files.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin for tests

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Create a temporary directory with a test notebook.
struct TestNotebook {
    temp_dir: TempDir,
    notebook_path: PathBuf,
}

impl TestNotebook {
    fn new(filename: &str, source: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let notebook_path = temp_dir.path().join(filename);
        fs::write(&notebook_path, source).expect("Failed to write notebook");

        Self {
            temp_dir,
            notebook_path,
        }
    }

    fn demo() -> Self {
        let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/post-with-code.py");
        Self::new(
            "post.py",
            &fs::read_to_string(demo).expect("Failed to read demo notebook"),
        )
    }

    fn path(&self) -> &str {
        self.notebook_path.to_str().unwrap()
    }

    fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn ipynb_path(&self) -> PathBuf {
        self.notebook_path.with_extension("ipynb")
    }
}

fn quire() -> Command {
    Command::cargo_bin("quire").expect("Failed to find quire binary")
}

fn simple_notebook() -> &'static str {
    r#"# %% [markdown]
# # Counting

# %% Setup
x = 5

# %%
for i in range(3):
  print(i * x)
"#
}

fn failing_notebook() -> &'static str {
    r#"# %%
print('before')

# %% Broken
print(greeting)

# %%
print('never printed')
"#
}

// =============================================================================
// quire run Tests
// =============================================================================

#[test]
fn test_run_nonexistent_notebook() {
    quire()
        .args(["run", "/nonexistent/notebook.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_run_simple_notebook() {
    let notebook = TestNotebook::new("simple.py", simple_notebook());

    quire()
        .args(["run", notebook.path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("0\n  5\n  10"))
        .stdout(predicate::str::contains("Setup"))
        .stdout(predicate::str::contains("Completed"));
}

#[test]
fn test_run_failure_names_the_cell() {
    let notebook = TestNotebook::new("broken.py", failing_notebook());

    quire()
        .args(["run", notebook.path()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("before"))
        .stdout(predicate::str::contains("never printed").not())
        .stderr(predicate::str::contains("Broken"))
        .stderr(predicate::str::contains("NameError"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn test_run_json_outputs() {
    let notebook = TestNotebook::new("simple.py", simple_notebook());

    let output = quire()
        .args(["run", "--json", notebook.path()])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let outputs: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let cells = outputs.as_array().expect("expected an array");
    assert_eq!(cells.len(), 3);
    assert_eq!(cells[0]["kind"], "prose");
    assert_eq!(cells[2]["items"][0]["text"], "0\n5\n10\n");
}

#[test]
fn test_run_loop_limit() {
    let notebook = TestNotebook::new("spin.py", "# %%\nwhile True:\n  pass\n");

    quire()
        .args(["run", "--max-loop-iterations", "100", notebook.path()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loop iteration limit of 100 exceeded"));
}

#[test]
fn test_run_demo_post() {
    let notebook = TestNotebook::demo();

    quire()
        .args(["run", notebook.path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Post With Code"))
        .stdout(predicate::str::contains("[figure 1: plt.subplots]"))
        .stdout(predicate::str::contains("[figure 2: visualizer.fit_transform]"));
}

// =============================================================================
// quire render Tests
// =============================================================================

#[test]
fn test_render_demo_writes_markdown_and_figures() {
    let notebook = TestNotebook::demo();

    quire().args(["render", notebook.path()]).assert().success();

    let markdown =
        fs::read_to_string(notebook.dir().join("post.md")).expect("post.md should exist");
    assert!(markdown.starts_with("---\n"));
    assert!(markdown.contains("![plt.subplots](post_files/figure-1.svg)"));
    assert!(notebook.dir().join("post_files/figure-1.svg").exists());
    assert!(notebook.dir().join("post_files/figure-2.svg").exists());
}

#[test]
fn test_render_embedded_figures() {
    let notebook = TestNotebook::demo();
    let output = notebook.dir().join("inline.md");

    quire()
        .args([
            "render",
            notebook.path(),
            "--embed-figures",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let markdown = fs::read_to_string(&output).unwrap();
    assert!(markdown.contains("](data:image/svg+xml;base64,"));
    assert!(!notebook.dir().join("inline_files").exists());
}

#[test]
fn test_render_failed_run_still_writes_page() {
    let notebook = TestNotebook::new("broken.py", failing_notebook());

    quire()
        .args(["render", notebook.path()])
        .assert()
        .failure();

    let markdown = fs::read_to_string(notebook.dir().join("broken.md")).unwrap();
    assert!(markdown.contains("```error\nNameError: name 'greeting' is not defined (line 1)\n```"));
    assert!(!markdown.contains("never printed"));
}

// =============================================================================
// quire sync / import Tests
// =============================================================================

#[test]
fn test_sync_creates_ipynb() {
    let notebook = TestNotebook::new("simple.py", simple_notebook());

    quire()
        .args(["sync", notebook.path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("simple.ipynb"));

    let content = fs::read_to_string(notebook.ipynb_path()).expect("ipynb should exist");
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["nbformat"], 4);
    assert_eq!(json["cells"].as_array().unwrap().len(), 3);
}

#[test]
fn test_sync_execute_includes_outputs() {
    let notebook = TestNotebook::new("simple.py", simple_notebook());

    quire()
        .args(["sync", "--execute", notebook.path()])
        .assert()
        .success();

    let content = fs::read_to_string(notebook.ipynb_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    let loop_cell = &json["cells"][2];
    assert_eq!(loop_cell["execution_count"], 2);
    assert_eq!(loop_cell["outputs"][0]["output_type"], "stream");
}

#[test]
fn test_import_roundtrip() {
    let notebook = TestNotebook::new("simple.py", simple_notebook());
    let restored = notebook.dir().join("restored.py");

    quire().args(["sync", notebook.path()]).assert().success();
    quire()
        .args([
            "import",
            notebook.ipynb_path().to_str().unwrap(),
            "-o",
            restored.to_str().unwrap(),
        ])
        .assert()
        .success();

    quire()
        .args(["run", restored.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("10"));
}

#[test]
fn test_import_refuses_to_overwrite() {
    let notebook = TestNotebook::new("simple.py", simple_notebook());
    quire().args(["sync", notebook.path()]).assert().success();

    // The default target is the original notebook
    quire()
        .args(["import", notebook.ipynb_path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
