/*
 * transforms/filter.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Cell-list transforms that drop cells.
 */

//! Transforms that drop cells which never reach the rendered page.

use crate::Result;
use crate::notebook::Cell;
use crate::patterns;
use crate::transform::CellListTransform;

/// Drop markdown cells that only serve as visual separators (`## Title -`).
/// Code cells are kept regardless of their content.
pub fn remove_fake_headers(cells: &mut Vec<Cell>) {
    cells.retain(|c| c.is_code() || !patterns::is_fake_header(&c.source));
}

/// Drop cells flagged `#hide`, `#default_exp` or `#default_cls_lvl`.
pub fn remove_hidden(cells: &mut Vec<Cell>) {
    cells.retain(|c| !patterns::is_hidden_cell(&c.source));
}

/// Drop cells with an empty source.
pub fn remove_empty(cells: &mut Vec<Cell>) {
    cells.retain(|c| !c.source.is_empty());
}

pub struct RemoveFakeHeaders;

impl CellListTransform for RemoveFakeHeaders {
    fn name(&self) -> &str {
        "remove-fake-headers"
    }

    fn transform(&self, cells: &mut Vec<Cell>) -> Result<()> {
        remove_fake_headers(cells);
        Ok(())
    }
}

pub struct RemoveHidden;

impl CellListTransform for RemoveHidden {
    fn name(&self) -> &str {
        "remove-hidden"
    }

    fn transform(&self, cells: &mut Vec<Cell>) -> Result<()> {
        remove_hidden(cells);
        Ok(())
    }
}

pub struct RemoveEmpty;

impl CellListTransform for RemoveEmpty {
    fn name(&self) -> &str {
        "remove-empty"
    }

    fn transform(&self, cells: &mut Vec<Cell>) -> Result<()> {
        remove_empty(cells);
        Ok(())
    }
}
