//! Integration tests for notebook execution.
//!
//! Tests the complete workflow from percent-format source to captured outputs.

use std::fs;
use std::path::{Path, PathBuf};

use quire_core::document::{Cell, Document, PercentParser};
use quire_core::execute::{CellRunner, ExecutionContext, RunState};
use quire_core::script::{ScriptKernel, Value};
use quire_core::state::{CellOutput, OutputItem, StreamName};
use quire_core::{Error, FigureRefs, render_blocks, to_markdown};

// =============================================================================
// Test Helpers
// =============================================================================

/// Notebook written to a temporary directory, removed on drop.
struct TestNotebook {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl TestNotebook {
    fn new(filename: &str, source: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create test directory");
        let path = dir.path().join(filename);
        fs::write(&path, source).expect("Failed to write notebook file");
        Self { _dir: dir, path }
    }

    fn parse(&self) -> Document {
        PercentParser::new()
            .parse_file(&self.path)
            .expect("Failed to parse notebook")
    }
}

fn demo_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/post-with-code.py")
}

fn parse(source: &str) -> Document {
    PercentParser::new()
        .parse_source(source)
        .expect("Failed to parse notebook")
}

fn run(document: &Document) -> (quire_core::Result<Vec<CellOutput>>, ExecutionContext, RunState) {
    let mut runner = CellRunner::new(ScriptKernel::default());
    let mut ctx = ExecutionContext::new();
    let result = runner.run(document, &mut ctx);
    (result, ctx, runner.state())
}

fn run_ok(document: &Document) -> (Vec<CellOutput>, ExecutionContext) {
    let (result, ctx, state) = run(document);
    assert_eq!(state, RunState::Completed);
    (result.expect("run should complete"), ctx)
}

// =============================================================================
// Runner properties
// =============================================================================

#[test]
fn test_one_output_per_cell() {
    let document = parse(
        "# %% [markdown]\n# Intro\n\n# %%\na = 1\n\n# %% [markdown]\n# More\n\n# %%\nb = a + 1\n",
    );
    let (outputs, ctx) = run_ok(&document);
    assert_eq!(outputs.len(), document.len());
    assert_eq!(ctx.get("b"), Some(&Value::Int(2)));
}

#[test]
fn test_removing_markdown_leaves_context_unchanged() {
    let with_prose = parse(
        "# %% [markdown]\n# Intro\n\n# %%\nx = 5\nxs = [x, x * 2]\n\n# %% [markdown]\n# Middle\n\n# %%\nimport matplotlib.pyplot as plt\nplt.plot(xs)\n",
    );
    let without_prose = Document::from_cells(
        with_prose
            .cells
            .iter()
            .filter(|cell| matches!(cell.kind, quire_core::CellKind::Code { .. }))
            .cloned()
            .collect::<Vec<Cell>>(),
    );

    let (_, ctx_a) = run_ok(&with_prose);
    let (_, ctx_b) = run_ok(&without_prose);
    assert_eq!(ctx_a, ctx_b);
}

#[test]
fn test_echo_only_changes_source_visibility() {
    let shown = parse("# %%\nprint('hi')\nimport matplotlib.pyplot as plt\nplt.show()\n");
    let hidden = parse("# %%\n#| echo: false\nprint('hi')\nimport matplotlib.pyplot as plt\nplt.show()\n");

    let (shown_outputs, _) = run_ok(&shown);
    let (hidden_outputs, _) = run_ok(&hidden);

    assert_eq!(shown_outputs[0].items(), hidden_outputs[0].items());
    let CellOutput::Code { source, .. } = &hidden_outputs[0] else {
        panic!("expected code output");
    };
    assert!(source.is_none());
    let CellOutput::Code { source, .. } = &shown_outputs[0] else {
        panic!("expected code output");
    };
    assert!(source.as_deref().is_some_and(|s| s.contains("print('hi')")));
}

#[test]
fn test_output_false_captures_nothing() {
    let document = parse(
        "# %%\n#| output: false\nprint('hidden')\nimport warnings\nwarnings.warn('w')\nimport seaborn as sns\nsns.boxplot(x=1)\n",
    );
    let (outputs, ctx) = run_ok(&document);
    assert!(outputs[0].items().is_empty());
    // The cell still ran
    assert!(ctx.contains("sns"));
}

#[test]
fn test_later_cells_see_earlier_bindings() {
    let document = parse("# %%\ngreeting = 'hello'\n\n# %%\nprint(greeting.upper())\n");
    let (outputs, _) = run_ok(&document);
    assert_eq!(outputs[1].stdout(), "HELLO\n");
}

#[test]
fn test_reversed_order_fails_with_name_error() {
    let document = parse("# %%\nprint(greeting)\n\n# %%\ngreeting = 'hello'\n");
    let (result, ctx, state) = run(&document);

    let Err(Error::CellExecution(failure)) = result else {
        panic!("expected a cell failure");
    };
    assert_eq!(failure.index, 0);
    assert_eq!(failure.kind, "NameError");
    assert_eq!(failure.message, "name 'greeting' is not defined");
    assert_eq!(state, RunState::Failed(0));
    assert!(!ctx.contains("greeting"));
}

#[test]
fn test_loop_output_is_one_text_block() {
    let document = parse("# %%\nfor i in range(9):\n  print(i)\n");
    let (outputs, _) = run_ok(&document);
    assert_eq!(
        outputs[0].items(),
        &[OutputItem::Stream {
            name: StreamName::Stdout,
            text: "0\n1\n2\n3\n4\n5\n6\n7\n8\n".to_string()
        }]
    );
}

#[test]
fn test_assignment_then_print() {
    let document = parse("# %%\nx = 5\n\n# %%\nprint(x)\n");
    let (outputs, ctx) = run_ok(&document);
    assert!(outputs[0].items().is_empty());
    assert_eq!(outputs[1].stdout(), "5\n");
    assert_eq!(ctx.get("x"), Some(&Value::Int(5)));
}

#[test]
fn test_failure_in_first_cell_stops_run() {
    let document = parse("# %%\nprint(undefined)\n\n# %%\nran = True\n\n# %%\nprint('never')\n");
    let (result, ctx, state) = run(&document);

    assert_eq!(state, RunState::Failed(0));
    assert!(!ctx.contains("ran"));
    let Err(Error::CellExecution(failure)) = result else {
        panic!("expected a cell failure");
    };
    assert_eq!(failure.outputs.len(), 1);
    assert_eq!(failure.line, Some(1));
    assert!(matches!(
        failure.outputs[0].error(),
        Some(OutputItem::Error { kind, .. }) if kind == "NameError"
    ));
}

#[test]
fn test_oversized_input_fails_the_cell() {
    let cases = [
        ("x = [0, 0, 0, 0] * 4611686018427387904".to_string(), "MemoryError"),
        ("x = 'ab' * 4611686018427387904".to_string(), "MemoryError"),
        ("x = list(range(10 ** 12))".to_string(), "MemoryError"),
        (
            "print(len(range(-9000000000000000000, 9000000000000000000)))".to_string(),
            "OverflowError",
        ),
        (
            format!("x = {}1{}", "(".repeat(100_000), ")".repeat(100_000)),
            "SyntaxError",
        ),
        (format!("x = {}1", "-".repeat(100_000)), "SyntaxError"),
    ];

    for (code, expected_kind) in cases {
        let document = parse(&format!("# %%
before = 1

# %%
{code}

# %%
after = 1
"));
        let (result, ctx, state) = run(&document);

        let Err(Error::CellExecution(failure)) = result else {
            panic!("expected a cell failure for {expected_kind}");
        };
        assert_eq!(failure.index, 1);
        assert_eq!(failure.kind, expected_kind);
        assert_eq!(state, RunState::Failed(1));
        assert!(ctx.contains("before"));
        assert!(!ctx.contains("x"));
        assert!(!ctx.contains("after"));
    }
}

#[test]
fn test_huge_range_indexing_does_not_wrap() {
    let document = parse(
        "# %%
r = range(-9000000000000000000, 9000000000000000000)
print(r[-1])
print(r[0])
",
    );
    let (outputs, _) = run_ok(&document);
    assert_eq!(
        outputs[0].stdout(),
        "8999999999999999999\n-9000000000000000000\n"
    );
}

#[test]
fn test_warning_filters_persist_across_cells() {
    let document = parse(
        "# %%\nimport warnings\nwarnings.warn('shown')\n\n# %%\nwarnings.filterwarnings('ignore')\n\n# %%\nwarnings.warn('hidden')\n",
    );
    let (outputs, _) = run_ok(&document);
    assert_eq!(outputs[0].items().len(), 1);
    assert!(outputs[0].items()[0].is_warning());
    assert!(outputs[2].items().is_empty());
}

#[test]
fn test_warning_directive_drops_warnings_only() {
    let document = parse("# %%\n#| warning: false\nimport warnings\nwarnings.warn('w')\nprint('kept')\n");
    let (outputs, _) = run_ok(&document);
    assert_eq!(outputs[0].items().len(), 1);
    assert_eq!(outputs[0].stdout(), "kept\n");
}

#[test]
fn test_eval_false_cell_is_not_executed() {
    let document = parse("# %%\n#| eval: false\nnever = 1\n\n# %%\nprint('after')\n");
    let (outputs, ctx) = run_ok(&document);
    assert!(!ctx.contains("never"));
    let CellOutput::Code {
        execution_count, ..
    } = &outputs[0]
    else {
        panic!("expected code output");
    };
    assert!(execution_count.is_none());
    assert_eq!(outputs[1].stdout(), "after\n");
}

#[test]
fn test_prose_is_never_executed() {
    let document = parse("# %% [markdown]\n# ```{r}\n# 1 + 1\n# ```\n\n# %%\nprint(1 + 1)\n");
    let (outputs, ctx) = run_ok(&document);
    assert_eq!(
        outputs[0],
        CellOutput::Prose {
            text: "```{r}\n1 + 1\n```".to_string()
        }
    );
    assert_eq!(ctx.execution_count(), 1);
}

// =============================================================================
// End-to-end: the demo post
// =============================================================================

#[test]
fn test_demo_post_runs_to_completion() {
    let document = PercentParser::new()
        .parse_file(demo_path())
        .expect("Failed to parse demo notebook");

    assert_eq!(document.title(), Some("Post With Code"));
    assert_eq!(document.len(), 8);

    let (outputs, ctx) = run_ok(&document);
    assert_eq!(outputs.len(), 8);

    // The R snippet is only prose
    assert!(outputs[0].items().is_empty());

    assert_eq!(outputs[1].stdout(), "0\n1\n2\n3\n4\n5\n6\n7\n8\n");
    assert!(outputs[2].items().is_empty());
    assert_eq!(ctx.get("x"), Some(&Value::Int(5)));

    // Hidden warnings setup
    let CellOutput::Code { source, items, .. } = &outputs[3] else {
        panic!("expected code output");
    };
    assert!(source.is_none());
    assert!(items.is_empty());

    let seaborn: Vec<_> = outputs[5].figures().collect();
    assert_eq!(seaborn.len(), 1);
    assert_eq!(seaborn[0].label, "plt.subplots");
    assert!(seaborn[0].calls.iter().any(|c| c == "sns.boxplot"));
    assert!(seaborn[0].calls.iter().any(|c| c == "sns.stripplot"));

    let yellowbrick: Vec<_> = outputs[7].figures().collect();
    assert_eq!(yellowbrick.len(), 1);
    assert_eq!(yellowbrick[0].id, 2);
    assert_eq!(yellowbrick[0].label, "visualizer.fit_transform");
}

#[test]
fn test_demo_post_renders_markdown() {
    let notebook = TestNotebook::new(
        "post.py",
        &fs::read_to_string(demo_path()).expect("Failed to read demo notebook"),
    );
    let document = notebook.parse();
    let (outputs, _) = run_ok(&document);

    let blocks = render_blocks(&outputs, "python");
    let markdown = to_markdown(&blocks, document.front_matter.as_ref(), FigureRefs::Directory("figures"))
        .expect("Failed to render markdown");

    assert!(markdown.starts_with("---\ntitle: Post With Code\n"));
    assert!(markdown.contains("```python\nfor i in range(9):\n  print(i)\n```"));
    assert!(markdown.contains("![plt.subplots](figures/figure-1.svg)"));
    assert!(markdown.contains("![visualizer.fit_transform](figures/figure-2.svg)"));
    assert!(!markdown.contains("filterwarnings"));
}
