/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Cell transformation pipeline infrastructure.
 */

//! Cell transformation pipeline infrastructure.
//!
//! Two kinds of transforms operate on a notebook's cells:
//!
//! - [`CellListTransform`] - sees the whole ordered list and may drop or
//!   insert cells (never reorder them)
//! - [`CellTransform`] - rewrites one cell at a time and never changes its
//!   `cell_type`
//!
//! [`CellListPipeline`] and [`CellPipeline`] run their transforms in
//! insertion order. The order is part of the contract: for example the
//! export-marker cleanup must not run before execution.
//!
//! # Example
//!
//! ```ignore
//! use nbdoc_core::transform::{CellPipeline, CellTransform};
//!
//! let mut pipeline = CellPipeline::new();
//! pipeline.push(Box::new(HideCells));
//! pipeline.push(Box::new(RemoveWidgetState));
//! pipeline.execute(&mut notebook.cells)?;
//! ```

use crate::Result;
use crate::notebook::Cell;

/// A transformation applied to each cell independently.
///
/// Transforms must be `Send + Sync` so documents can be converted on
/// worker threads.
pub trait CellTransform: Send + Sync {
    /// Human-readable name for this transform.
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &str;

    /// Rewrite one cell in place.
    fn transform(&self, cell: &mut Cell) -> Result<()>;
}

/// A transformation over the whole ordered list of cells.
pub trait CellListTransform: Send + Sync {
    /// Human-readable name for this transform.
    fn name(&self) -> &str;

    /// Filter or extend `cells`. Surviving cells keep their relative order.
    fn transform(&self, cells: &mut Vec<Cell>) -> Result<()>;
}

/// Cell-list transforms run in insertion order.
pub struct CellListPipeline {
    transforms: Vec<Box<dyn CellListTransform>>,
}

impl CellListPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    pub fn push(&mut self, transform: Box<dyn CellListTransform>) {
        self.transforms.push(transform);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Execute all transforms in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered. Execution stops on error.
    pub fn execute(&self, cells: &mut Vec<Cell>) -> Result<()> {
        for transform in &self.transforms {
            tracing::debug!(transform = transform.name(), cells = cells.len(), "Running cell-list transform");
            transform.transform(cells)?;
        }
        Ok(())
    }

    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl Default for CellListPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-cell transforms, all applied to one cell before moving to the next.
pub struct CellPipeline {
    transforms: Vec<Box<dyn CellTransform>>,
}

impl CellPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    pub fn push(&mut self, transform: Box<dyn CellTransform>) {
        self.transforms.push(transform);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Apply every transform to a single cell, in insertion order.
    pub fn apply(&self, cell: &mut Cell) -> Result<()> {
        for transform in &self.transforms {
            transform.transform(cell)?;
        }
        Ok(())
    }

    /// Apply the pipeline to every cell.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered. Later cells are left untouched.
    pub fn execute(&self, cells: &mut [Cell]) -> Result<()> {
        tracing::debug!(transforms = ?self.transform_names(), "Running cell transforms");
        for cell in cells.iter_mut() {
            self.apply(cell)?;
        }
        Ok(())
    }

    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl Default for CellPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NbdocError;
    use std::sync::{Arc, Mutex};

    /// Appends its tag to every cell source and records when it ran.
    struct TaggingTransform {
        tag: &'static str,
        order_tracker: Arc<Mutex<Vec<&'static str>>>,
    }

    impl CellTransform for TaggingTransform {
        fn name(&self) -> &str {
            self.tag
        }

        fn transform(&self, cell: &mut Cell) -> Result<()> {
            cell.source.push_str(self.tag);
            self.order_tracker.lock().unwrap().push(self.tag);
            Ok(())
        }
    }

    struct FailingTransform;

    impl CellTransform for FailingTransform {
        fn name(&self) -> &str {
            "failing"
        }

        fn transform(&self, _cell: &mut Cell) -> Result<()> {
            Err(NbdocError::other("Transform failed intentionally"))
        }
    }

    struct DropMarkdown;

    impl CellListTransform for DropMarkdown {
        fn name(&self) -> &str {
            "drop-markdown"
        }

        fn transform(&self, cells: &mut Vec<Cell>) -> Result<()> {
            cells.retain(|c| !c.is_markdown());
            Ok(())
        }
    }

    #[test]
    fn test_empty_pipelines() {
        assert!(CellPipeline::new().is_empty());
        assert!(CellListPipeline::new().is_empty());
    }

    #[test]
    fn test_cell_transforms_run_in_insertion_order_per_cell() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = CellPipeline::new();
        pipeline.push(Box::new(TaggingTransform {
            tag: "a",
            order_tracker: order.clone(),
        }));
        pipeline.push(Box::new(TaggingTransform {
            tag: "b",
            order_tracker: order.clone(),
        }));

        let mut cells = vec![Cell::code("1"), Cell::code("2")];
        pipeline.execute(&mut cells).unwrap();

        assert_eq!(cells[0].source, "1ab");
        assert_eq!(cells[1].source, "2ab");
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "a", "b"]);
        assert_eq!(pipeline.transform_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_error_stops_execution() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = CellPipeline::new();
        pipeline.push(Box::new(FailingTransform));
        pipeline.push(Box::new(TaggingTransform {
            tag: "after",
            order_tracker: order.clone(),
        }));

        let mut cells = vec![Cell::code("x")];
        assert!(pipeline.execute(&mut cells).is_err());
        assert!(order.lock().unwrap().is_empty());
        assert_eq!(cells[0].source, "x");
    }

    #[test]
    fn test_list_pipeline() {
        let mut pipeline = CellListPipeline::new();
        pipeline.push(Box::new(DropMarkdown));
        let mut cells = vec![Cell::markdown("m"), Cell::code("c")];
        pipeline.execute(&mut cells).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(pipeline.transform_names(), vec!["drop-markdown"]);
    }
}
