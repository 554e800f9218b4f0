/*
 * execute/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Selective execution of documentation cells.
 */

//! Selective cell execution.
//!
//! Only two kinds of code cells are re-run when building documentation:
//! `show_doc(...)` calls and imports from the documented library. Every
//! other cell keeps the outputs stored in the notebook. The import cell
//! [`execute_nb`] prepends always runs first, so `show_doc` is in scope even
//! when the notebook names no module.
//!
//! Evaluation itself is delegated to a [`CellEvaluator`]. The built-in
//! [`NbconvertEvaluator`] pipes the selected cells through
//! `jupyter nbconvert --execute`; tests substitute an in-process mock.
//!
//! ```ignore
//! let evaluator = NbconvertEvaluator::new(&config.kernel_name);
//! execute_nb(&mut notebook, Some("core"), &config, &evaluator)?;
//! ```

mod error;
mod nbconvert;

use std::time::Duration;

use serde_json::{Map, Value};

pub use error::ExecutionError;
pub use nbconvert::{NbconvertEvaluator, find_jupyter};

use crate::config::DocConfig;
use crate::notebook::{Cell, Notebook};
use crate::patterns::ExecutablePattern;

/// Result of evaluating one cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluatedCell {
    pub outputs: Vec<Value>,
    pub execution_count: Option<u64>,
}

/// Evaluates notebook code cells.
///
/// Implementations must be `Send + Sync` so one evaluator can serve every
/// worker of a parallel batch.
pub trait CellEvaluator: Send + Sync {
    /// Human-readable name, used in logs and errors.
    fn name(&self) -> &str;

    /// Run the cells at `indices` of `notebook`, in order, and return one
    /// result per index in the same order.
    fn evaluate(
        &self,
        notebook: &Notebook,
        indices: &[usize],
        timeout: Duration,
    ) -> Result<Vec<EvaluatedCell>, ExecutionError>;
}

/// The hidden cell that brings `show_doc` and the documented module into
/// scope before anything else runs.
pub fn import_show_doc_cell(lib_name: &str, module: Option<&str>) -> Cell {
    let mut source = String::from("#export\nfrom nbdev.showdoc import show_doc");
    if let Some(module) = module {
        source.push_str(&format!("\nfrom {}.{} import *", lib_name, module));
    }
    let mut metadata = Map::new();
    metadata.insert("hide_input".to_string(), Value::Bool(true));
    Cell {
        metadata,
        ..Cell::code(source)
    }
}

/// Runs an evaluator on the executable cells of a notebook only.
pub struct SelectiveExecutor<'a> {
    pattern: ExecutablePattern,
    evaluator: &'a dyn CellEvaluator,
    timeout: Duration,
    leading: bool,
}

impl<'a> SelectiveExecutor<'a> {
    pub fn new(lib_name: &str, evaluator: &'a dyn CellEvaluator, timeout: Duration) -> Self {
        Self {
            pattern: ExecutablePattern::new(lib_name),
            evaluator,
            timeout,
            leading: false,
        }
    }

    /// Always run the first cell, whatever its source. Used for the
    /// injected import cell.
    pub fn with_leading_cell(mut self) -> Self {
        self.leading = true;
        self
    }

    /// Indices of the code cells that should be executed.
    pub fn select(&self, notebook: &Notebook) -> Vec<usize> {
        notebook
            .cells
            .iter()
            .enumerate()
            .filter(|(i, cell)| {
                cell.is_code()
                    && ((self.leading && *i == 0) || self.pattern.is_match(&cell.source))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Evaluate the selected cells and store their outputs. Cells that are
    /// not selected are left exactly as they were.
    pub fn execute(&self, notebook: &mut Notebook) -> Result<(), ExecutionError> {
        let indices = self.select(notebook);
        if indices.is_empty() {
            tracing::debug!("No cells to execute");
            return Ok(());
        }

        tracing::debug!(
            evaluator = self.evaluator.name(),
            cells = indices.len(),
            "Executing cells"
        );
        let results = self.evaluator.evaluate(notebook, &indices, self.timeout)?;
        if results.len() != indices.len() {
            return Err(ExecutionError::CellCountMismatch {
                expected: indices.len(),
                returned: results.len(),
            });
        }

        for (index, result) in indices.into_iter().zip(results) {
            let cell = &mut notebook.cells[index];
            cell.outputs = result.outputs;
            cell.execution_count = result.execution_count;
        }
        Ok(())
    }
}

/// Prepend the import cell and execute the notebook's `show_doc` and
/// library-import cells.
pub fn execute_nb(
    notebook: &mut Notebook,
    module: Option<&str>,
    config: &DocConfig,
    evaluator: &dyn CellEvaluator,
) -> Result<(), ExecutionError> {
    notebook
        .cells
        .insert(0, import_show_doc_cell(&config.lib_name, module));
    SelectiveExecutor::new(&config.lib_name, evaluator, config.execute_timeout())
        .with_leading_cell()
        .execute(notebook)
}

/// Evaluator that leaves every cell untouched. Used when execution is
/// turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvaluator;

impl CellEvaluator for NoopEvaluator {
    fn name(&self) -> &str {
        "noop"
    }

    fn evaluate(
        &self,
        notebook: &Notebook,
        indices: &[usize],
        _timeout: Duration,
    ) -> Result<Vec<EvaluatedCell>, ExecutionError> {
        Ok(indices
            .iter()
            .map(|&i| EvaluatedCell {
                outputs: notebook.cells[i].outputs.clone(),
                execution_count: notebook.cells[i].execution_count,
            })
            .collect())
    }
}
