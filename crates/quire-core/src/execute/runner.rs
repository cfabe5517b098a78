//! Sequential cell runner.
//!
//! Walks a document top to bottom. Markdown cells pass through as prose;
//! code cells are handed to the kernel against one shared
//! [`ExecutionContext`]. The first failing cell halts the run.

use std::fmt;

use super::capture::OutputCapture;
use super::context::{AbortHandle, ExecutionCallback, ExecutionContext};
use super::kernel::Kernel;
use crate::document::{Cell, CellKind, Directives, Document};
use crate::error::{CellExecutionError, Error, Result};
use crate::state::{CellOutput, OutputItem};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Processing the cell at this index
    Running(usize),
    Completed,
    /// Halted at the cell at this index
    Failed(usize),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Running(i) => write!(f, "running cell {i}"),
            Self::Completed => f.write_str("completed"),
            Self::Failed(i) => write!(f, "failed at cell {i}"),
        }
    }
}

/// Runs the cells of one document, in order, exactly once.
pub struct CellRunner<K: Kernel> {
    kernel: K,
    state: RunState,
    /// Execution callback for progress reporting
    callback: Option<Box<dyn ExecutionCallback>>,
    /// Abort handle for cooperative cancellation
    abort_handle: Option<AbortHandle>,
}

impl<K: Kernel> CellRunner<K> {
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            state: RunState::NotStarted,
            callback: None,
            abort_handle: None,
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Set the execution callback for progress reporting.
    pub fn set_callback(&mut self, callback: impl ExecutionCallback + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Set the abort handle for cooperative cancellation.
    pub fn set_abort_handle(&mut self, handle: AbortHandle) {
        self.abort_handle = Some(handle);
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn is_aborted(&self) -> bool {
        self.abort_handle
            .as_ref()
            .is_some_and(|h| h.is_aborted())
    }

    /// Run every cell of `document` against `ctx`.
    ///
    /// Returns one output per cell in document order. On a kernel error the
    /// run stops at that cell and returns [`Error::CellExecution`] carrying
    /// the outputs produced so far. Returns [`Error::Aborted`] if the abort
    /// handle fires between cells.
    pub fn run(
        &mut self,
        document: &Document,
        ctx: &mut ExecutionContext,
    ) -> Result<Vec<CellOutput>> {
        if self.state != RunState::NotStarted {
            return Err(Error::InvalidOperation(format!(
                "runner has already {}; create a new runner to run again",
                self.state
            )));
        }

        let mut outputs = Vec::with_capacity(document.len());

        for (index, cell) in document.cells.iter().enumerate() {
            self.state = RunState::Running(index);

            if self.is_aborted() {
                tracing::warn!("Run aborted before cell {}", index);
                self.state = RunState::Failed(index);
                return Err(Error::Aborted);
            }

            match &cell.kind {
                CellKind::Markdown { text } => {
                    outputs.push(CellOutput::Prose { text: text.clone() });
                }
                CellKind::Code { source, directives } => {
                    match self.run_code(cell, source, directives, ctx) {
                        Ok(output) => outputs.push(output),
                        Err((output, failure)) => {
                            outputs.push(output);
                            self.state = RunState::Failed(index);
                            let error = Error::CellExecution(CellExecutionError {
                                index,
                                kind: failure.kind,
                                message: failure.message,
                                line: failure.line,
                                outputs,
                            });
                            tracing::warn!("{}", error);
                            if let Some(ref callback) = self.callback {
                                callback.on_cell_error(cell.id, &cell.display_name(), &error);
                            }
                            return Err(error);
                        }
                    }
                }
            }
        }

        self.state = RunState::Completed;
        tracing::info!(
            "Ran {} cells ({} code cells executed)",
            outputs.len(),
            ctx.execution_count()
        );
        Ok(outputs)
    }

    /// Execute one code cell and shape its output per its directives.
    fn run_code(
        &mut self,
        cell: &Cell,
        source: &str,
        directives: &Directives,
        ctx: &mut ExecutionContext,
    ) -> std::result::Result<CellOutput, (CellOutput, super::kernel::CellFailure)> {
        let name = cell.display_name();
        let echoed = directives.echo.then(|| source.to_string());

        if !directives.eval {
            tracing::debug!("Skipping cell {} (eval: false)", name);
            if let Some(ref callback) = self.callback {
                callback.on_cell_skipped(cell.id, &name);
            }
            return Ok(CellOutput::Code {
                source: echoed,
                items: Vec::new(),
                execution_count: None,
            });
        }

        if let Some(ref callback) = self.callback {
            callback.on_cell_started(cell.id, &name);
        }
        tracing::debug!("Executing cell {}", name);

        let execution_count = ctx.next_execution_count();
        let mut capture = OutputCapture::new();
        let result = self.kernel.execute(source, ctx, &mut capture);

        let mut items = capture.into_items();
        if !directives.output {
            items.clear();
        } else if !directives.warning {
            items.retain(|item| !item.is_warning());
        }

        match result {
            Ok(()) => {
                if let Some(ref callback) = self.callback {
                    callback.on_cell_completed(cell.id, &name);
                }
                Ok(CellOutput::Code {
                    source: echoed,
                    items,
                    execution_count: Some(execution_count),
                })
            }
            Err(failure) => {
                // The error is reported even when other output is suppressed.
                items.push(OutputItem::Error {
                    kind: failure.kind.clone(),
                    message: failure.message.clone(),
                    line: failure.line,
                });
                let output = CellOutput::Code {
                    source: echoed,
                    items,
                    execution_count: Some(execution_count),
                };
                Err((output, failure))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::document::{CellId, Directives};
    use crate::execute::CellFailure;

    /// Kernel that echoes each line to stdout and fails on `fail`.
    struct EchoKernel;

    impl Kernel for EchoKernel {
        fn language(&self) -> &str {
            "echo"
        }

        fn execute(
            &mut self,
            source: &str,
            ctx: &mut ExecutionContext,
            capture: &mut OutputCapture,
        ) -> std::result::Result<(), CellFailure> {
            for line in source.lines() {
                if line == "fail" {
                    return Err(CellFailure::new("RuntimeError", "asked to fail"));
                }
                if let Some(message) = line.strip_prefix("warn ") {
                    capture.stderr(&format!("UserWarning: {message}\n"));
                    continue;
                }
                capture.stdout(&format!("{line}\n"));
                ctx.set(line, crate::script::Value::None);
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl ExecutionCallback for Recorder {
        fn on_cell_started(&self, cell_id: CellId, _name: &str) {
            self.events.lock().unwrap().push(format!("start {cell_id}"));
        }

        fn on_cell_completed(&self, cell_id: CellId, _name: &str) {
            self.events.lock().unwrap().push(format!("done {cell_id}"));
        }

        fn on_cell_error(&self, cell_id: CellId, _name: &str, _error: &Error) {
            self.events.lock().unwrap().push(format!("error {cell_id}"));
        }

        fn on_cell_skipped(&self, cell_id: CellId, _name: &str) {
            self.events.lock().unwrap().push(format!("skip {cell_id}"));
        }
    }

    fn doc(cells: Vec<Cell>) -> Document {
        Document::from_cells(cells)
    }

    #[test]
    fn test_outputs_follow_document_order() {
        let document = doc(vec![
            Cell::markdown(0, "# Title"),
            Cell::code(0, "a"),
            Cell::markdown(0, "text"),
            Cell::code(0, "b"),
        ]);
        let mut runner = CellRunner::new(EchoKernel);
        let mut ctx = ExecutionContext::new();

        let outputs = runner.run(&document, &mut ctx).unwrap();
        assert_eq!(outputs.len(), 4);
        assert_eq!(
            outputs[0],
            CellOutput::Prose {
                text: "# Title".to_string()
            }
        );
        assert_eq!(outputs[3].stdout(), "b\n");
        assert_eq!(runner.state(), RunState::Completed);
        assert_eq!(ctx.execution_count(), 2);
    }

    #[test]
    fn test_failure_halts_and_keeps_partial_outputs() {
        let document = doc(vec![
            Cell::code(0, "a"),
            Cell::code(0, "b\nfail\nc"),
            Cell::code(0, "d"),
        ]);
        let mut runner = CellRunner::new(EchoKernel);
        let mut ctx = ExecutionContext::new();

        let err = runner.run(&document, &mut ctx).unwrap_err();
        let Error::CellExecution(failure) = err else {
            panic!("expected a cell failure, got {err:?}");
        };
        assert_eq!(failure.index, 1);
        assert_eq!(failure.kind, "RuntimeError");
        assert_eq!(failure.outputs.len(), 2);
        assert_eq!(failure.outputs[1].stdout(), "b\n");
        assert!(failure.outputs[1].error().is_some());
        assert_eq!(runner.state(), RunState::Failed(1));
        assert!(!ctx.contains("d"));
    }

    #[test]
    fn test_second_run_is_rejected() {
        let document = doc(vec![Cell::code(0, "a")]);
        let mut runner = CellRunner::new(EchoKernel);
        let mut ctx = ExecutionContext::new();
        runner.run(&document, &mut ctx).unwrap();

        let err = runner.run(&document, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
        assert_eq!(runner.state(), RunState::Completed);
    }

    #[test]
    fn test_directives_shape_output() {
        let hidden = Directives {
            echo: false,
            ..Directives::default()
        };
        let silent = Directives {
            output: false,
            ..Directives::default()
        };
        let skipped = Directives {
            eval: false,
            ..Directives::default()
        };
        let quiet = Directives {
            warning: false,
            ..Directives::default()
        };
        let document = doc(vec![
            Cell::code_with(0, "a", hidden),
            Cell::code_with(0, "b", silent),
            Cell::code_with(0, "c", skipped),
            Cell::code_with(0, "warn w\nd", quiet),
        ]);
        let mut runner = CellRunner::new(EchoKernel);
        let mut ctx = ExecutionContext::new();
        let outputs = runner.run(&document, &mut ctx).unwrap();

        let CellOutput::Code { source, items, .. } = &outputs[0] else {
            panic!("expected code output");
        };
        assert!(source.is_none());
        assert_eq!(items.len(), 1);

        assert!(outputs[1].items().is_empty());
        assert!(ctx.contains("b"));

        let CellOutput::Code {
            source,
            items,
            execution_count,
        } = &outputs[2]
        else {
            panic!("expected code output");
        };
        assert_eq!(source.as_deref(), Some("c"));
        assert!(items.is_empty());
        assert!(execution_count.is_none());
        assert!(!ctx.contains("c"));

        assert_eq!(outputs[3].items().len(), 1);
        assert_eq!(outputs[3].stdout(), "d\n");
    }

    #[test]
    fn test_abort_before_cell() {
        let document = doc(vec![Cell::code(0, "a"), Cell::code(0, "b")]);
        let handle = AbortHandle::new();
        handle.abort();

        let mut runner = CellRunner::new(EchoKernel);
        runner.set_abort_handle(handle);
        let mut ctx = ExecutionContext::new();

        let err = runner.run(&document, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::Aborted));
        assert_eq!(runner.state(), RunState::Failed(0));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_callback_events() {
        let skipped = Directives {
            eval: false,
            ..Directives::default()
        };
        let document = doc(vec![
            Cell::code(0, "a"),
            Cell::markdown(0, "prose"),
            Cell::code_with(0, "b", skipped),
            Cell::code(0, "fail"),
        ]);
        let recorder = Recorder::default();
        let mut runner = CellRunner::new(EchoKernel);
        runner.set_callback(recorder.clone());
        let mut ctx = ExecutionContext::new();

        assert!(runner.run(&document, &mut ctx).is_err());
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![
                "start cell_0",
                "done cell_0",
                "skip cell_2",
                "start cell_3",
                "error cell_3"
            ]
        );
    }
}
