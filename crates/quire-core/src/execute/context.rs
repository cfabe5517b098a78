//! Execution context and callbacks for Quire runs.
//!
//! The [`ExecutionContext`] is the single namespace shared by every code cell
//! of a document. It is created once per run and passed to the runner by
//! mutable reference, so the host can inspect it after the run finishes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustc_hash::{FxHashMap, FxHashSet};

use super::figure::FigureState;
use crate::document::CellId;
use crate::error::Error;
use crate::script::Value;

/// Handle for cooperative cancellation of a run.
///
/// Clones share one flag; aborting any clone is visible to all of them.
/// The runner checks the flag before each cell.
///
/// ```
/// use quire_core::execute::AbortHandle;
///
/// let handle = AbortHandle::new();
/// let clone = handle.clone();
/// clone.abort();
/// assert!(handle.is_aborted());
/// ```
#[derive(Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Request that the run stop before the next cell.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.aborted.store(false, Ordering::Relaxed);
    }
}

/// Callback trait for execution progress reporting.
pub trait ExecutionCallback: Send + Sync {
    /// Called when a code cell starts executing.
    fn on_cell_started(&self, cell_id: CellId, name: &str);

    /// Called when a code cell completes successfully.
    fn on_cell_completed(&self, cell_id: CellId, name: &str);

    /// Called when a code cell fails.
    fn on_cell_error(&self, cell_id: CellId, name: &str, error: &Error);

    /// Called for code cells marked `eval: false`.
    fn on_cell_skipped(&self, _cell_id: CellId, _name: &str) {}
}

/// What to do with a raised warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningAction {
    /// Show the first occurrence of each distinct warning.
    Default,
    Always,
    Ignore,
    /// Raise the warning as an error.
    Error,
}

impl WarningAction {
    /// Parse a filter action name. `once` and `module` behave like `default`.
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "default" | "once" | "module" => Some(Self::Default),
            "always" => Some(Self::Always),
            "ignore" => Some(Self::Ignore),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WarningRule {
    action: WarningAction,
    /// Lower-cased message prefix; empty matches everything
    message: String,
    /// `None` matches every category
    category: Option<String>,
}

/// Warning filter state. Filters persist for the rest of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningFilters {
    rules: Vec<WarningRule>,
    seen: FxHashSet<(String, String)>,
}

impl WarningFilters {
    /// Insert a filter ahead of the existing ones.
    pub fn add(&mut self, action: WarningAction, message: &str, category: Option<&str>) {
        let rule = WarningRule {
            action,
            message: message.to_lowercase(),
            category: category.map(str::to_string),
        };
        self.rules.retain(|existing| *existing != rule);
        self.rules.insert(0, rule);
    }

    /// Remove every filter.
    pub fn reset(&mut self) {
        self.rules.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve the effective action for a warning being raised.
    ///
    /// `Default` is resolved here: the first occurrence of a warning is
    /// reported as `Always`, repeats as `Ignore`.
    pub fn resolve(&mut self, category: &str, message: &str) -> WarningAction {
        let lowered = message.to_lowercase();
        let action = self
            .rules
            .iter()
            .find(|rule| {
                rule.category.as_deref().is_none_or(|c| c == category)
                    && lowered.starts_with(&rule.message)
            })
            .map_or(WarningAction::Default, |rule| rule.action);

        match action {
            WarningAction::Default => {
                if self
                    .seen
                    .insert((category.to_string(), message.to_string()))
                {
                    WarningAction::Always
                } else {
                    WarningAction::Ignore
                }
            }
            other => other,
        }
    }
}

/// Shared state of a document run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    namespace: FxHashMap<String, Value>,
    pub warnings: WarningFilters,
    pub figures: FigureState,
    execution_count: u32,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.namespace.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.namespace.get_mut(name)
    }

    /// Bind a name, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.namespace.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.namespace.contains_key(name)
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.namespace.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.namespace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty()
    }

    /// Number of cells executed so far.
    pub fn execution_count(&self) -> u32 {
        self.execution_count
    }

    pub(crate) fn next_execution_count(&mut self) -> u32 {
        self.execution_count += 1;
        self.execution_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_handle_clone_shares_state() {
        let handle = AbortHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_aborted());

        clone.abort();
        assert!(handle.is_aborted());

        handle.reset();
        assert!(!clone.is_aborted());
    }

    #[test]
    fn test_namespace() {
        let mut ctx = ExecutionContext::new();
        assert!(ctx.is_empty());
        ctx.set("x", Value::Int(5));
        ctx.set("a", Value::None);
        assert_eq!(ctx.get("x"), Some(&Value::Int(5)));
        assert!(ctx.contains("a"));
        assert_eq!(ctx.names(), vec!["a", "x"]);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_warning_default_shows_once() {
        let mut filters = WarningFilters::default();
        assert_eq!(filters.resolve("UserWarning", "w"), WarningAction::Always);
        assert_eq!(filters.resolve("UserWarning", "w"), WarningAction::Ignore);
        assert_eq!(filters.resolve("UserWarning", "other"), WarningAction::Always);
    }

    #[test]
    fn test_warning_filters_match_newest_first() {
        let mut filters = WarningFilters::default();
        filters.add(WarningAction::Ignore, "", None);
        filters.add(WarningAction::Error, "", Some("FutureWarning"));

        assert_eq!(filters.resolve("FutureWarning", "x"), WarningAction::Error);
        assert_eq!(filters.resolve("UserWarning", "x"), WarningAction::Ignore);

        filters.reset();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_warning_message_prefix() {
        let mut filters = WarningFilters::default();
        filters.add(WarningAction::Ignore, "Deprecated", None);
        assert_eq!(
            filters.resolve("UserWarning", "deprecated call"),
            WarningAction::Ignore
        );
        assert_eq!(filters.resolve("UserWarning", "fine"), WarningAction::Always);
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(WarningAction::parse("once"), Some(WarningAction::Default));
        assert_eq!(WarningAction::parse("ignore"), Some(WarningAction::Ignore));
        assert_eq!(WarningAction::parse("bogus"), None);
    }
}
