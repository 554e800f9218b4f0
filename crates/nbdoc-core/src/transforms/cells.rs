/*
 * transforms/cells.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Small per-cell cleanup transforms.
 */

//! Per-cell cleanups: input hiding, widget output removal and export
//! marker stripping.

use serde_json::{Map, Value};

use crate::Result;
use crate::notebook::{Cell, WIDGET_VIEW_MIME};
use crate::patterns;
use crate::transform::CellTransform;

/// Mark code cells carrying `show_doc(`, `# export` or `# hide_input` so
/// their input is left out of the page. The cell metadata is replaced.
pub fn hide_cells(cell: &mut Cell) {
    if cell.is_code() && patterns::hides_input(&cell.source) {
        let mut metadata = Map::new();
        metadata.insert("hide_input".to_string(), Value::Bool(true));
        cell.metadata = metadata;
    }
}

/// Drop outputs that display interactive widgets; they cannot render
/// on a static page.
pub fn remove_widget_state(cell: &mut Cell) {
    if !cell.is_code() {
        return;
    }
    cell.outputs.retain(|output| {
        !output
            .get("data")
            .and_then(Value::as_object)
            .is_some_and(|data| data.contains_key(WIDGET_VIEW_MIME))
    });
}

/// Remove a leading `#exports` line.
pub fn clean_exports(cell: &mut Cell) {
    if let std::borrow::Cow::Owned(cleaned) = patterns::EXPORTS_LINE.replace(&cell.source, "") {
        cell.source = cleaned;
    }
}

pub struct HideCells;

impl CellTransform for HideCells {
    fn name(&self) -> &str {
        "hide-cells"
    }

    fn transform(&self, cell: &mut Cell) -> Result<()> {
        hide_cells(cell);
        Ok(())
    }
}

pub struct RemoveWidgetState;

impl CellTransform for RemoveWidgetState {
    fn name(&self) -> &str {
        "remove-widget-state"
    }

    fn transform(&self, cell: &mut Cell) -> Result<()> {
        remove_widget_state(cell);
        Ok(())
    }
}

pub struct CleanExports;

impl CellTransform for CleanExports {
    fn name(&self) -> &str {
        "clean-exports"
    }

    fn transform(&self, cell: &mut Cell) -> Result<()> {
        clean_exports(cell);
        Ok(())
    }
}
