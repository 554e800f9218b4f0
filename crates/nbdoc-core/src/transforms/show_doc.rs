/*
 * transforms/show_doc.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Documentation stubs for exported functions and classes.
 */

//! Injection of `show_doc` cells for exported names.
//!
//! Every exported code cell is followed by one `show_doc(name, ...)` cell per
//! public function or class it defines, unless the notebook already calls
//! `show_doc` on that name somewhere.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Result;
use crate::notebook::Cell;
use crate::patterns;
use crate::transform::CellListTransform;

/// Heading level used for classes when no `#default_cls_lvl` is given.
pub const DEFAULT_CLASS_LEVEL: u32 = 2;

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:async\s+def|def|class)\s+([^\(\s:]+)").expect("valid regex")
});

static ALL_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?ms)^__all__\s*=\s*\[([^\]]*)\]").expect("valid regex"));

static QUOTED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("valid regex"));

/// Extracts the names an exported cell makes public.
pub trait ExportNames: Send + Sync {
    fn export_names(&self, source: &str) -> Vec<String>;
}

/// Public top-level `def`, `async def` and `class` names of Python code,
/// followed by any extra names listed in `__all__`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonExportNames;

impl ExportNames for PythonExportNames {
    fn export_names(&self, source: &str) -> Vec<String> {
        let mut names: Vec<String> = DEFINITION
            .captures_iter(source)
            .map(|caps| caps[1].to_string())
            .filter(|name| !name.starts_with('_'))
            .collect();

        if let Some(list) = ALL_LIST.captures(source) {
            for caps in QUOTED_NAME.captures_iter(&list[1]) {
                let name = caps[1].to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Class heading level from the first `#default_cls_lvl N` code cell.
pub fn find_default_level(cells: &[Cell]) -> u32 {
    cells
        .iter()
        .filter(|c| c.is_code())
        .find_map(|c| patterns::default_class_level(&c.source))
        .unwrap_or(DEFAULT_CLASS_LEVEL)
}

/// A code cell documenting `name`.
pub fn show_doc_cell(name: &str, level: u32) -> Cell {
    Cell::code(format!("show_doc({}, default_cls_level={})", name, level))
}

/// Insert a `show_doc` cell after each exported cell for every name it
/// exports that is not documented yet.
pub fn add_show_docs(cells: &mut Vec<Cell>, level: u32, exports: &dyn ExportNames) {
    let mut documented: HashSet<String> = cells
        .iter()
        .filter(|c| c.is_code())
        .filter_map(|c| patterns::show_doc_target(&c.source))
        .map(str::to_string)
        .collect();

    let mut result = Vec::with_capacity(cells.len());
    let mut injected = 0;
    for cell in cells.drain(..) {
        let names = if cell.is_code() && patterns::is_export_cell(&cell.source) {
            exports.export_names(&cell.source)
        } else {
            Vec::new()
        };
        result.push(cell);
        for name in names {
            if documented.insert(name.clone()) {
                result.push(show_doc_cell(&name, level));
                injected += 1;
            }
        }
    }
    if injected > 0 {
        tracing::debug!(injected, "Added show_doc cells");
    }
    *cells = result;
}

pub struct AddShowDocs {
    level: u32,
    exports: Box<dyn ExportNames>,
}

impl AddShowDocs {
    pub fn new(level: u32) -> Self {
        Self::with_exports(level, Box::new(PythonExportNames))
    }

    pub fn with_exports(level: u32, exports: Box<dyn ExportNames>) -> Self {
        Self { level, exports }
    }
}

impl CellListTransform for AddShowDocs {
    fn name(&self) -> &str {
        "add-show-docs"
    }

    fn transform(&self, cells: &mut Vec<Cell>) -> Result<()> {
        add_show_docs(cells, self.level, self.exports.as_ref());
        Ok(())
    }
}
