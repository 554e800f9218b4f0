/*
 * pipeline.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Canonical transform orders for HTML and Markdown output.
 */

//! Canonical pipelines.
//!
//! ## HTML target
//!
//! 1. Cell list: remove fake headers, remove hidden cells, remove empty
//!    cells, add `show_doc` cells
//! 2. Per cell: copy images, hide cells, remove widget state, Jekyll notes,
//!    backtick links
//! 3. Selective execution (see [`crate::execute`])
//! 4. Strip `#exports` lines
//!
//! ## Markdown target
//!
//! 1. Cell list: remove fake headers, remove hidden cells, remove empty cells
//! 2. Per cell: adapt image paths, hide cells, remove widget state, Jekyll
//!    notes
//!
//! Export cleanup must follow execution, and header removal must precede
//! image copying; the builders below are the only place these orders live.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::transform::{CellListPipeline, CellPipeline};
use crate::transforms::{
    AdaptImgPath, AddJekyllNotes, AddShowDocs, CleanExports, CopyImages, HideCells, RemoveEmpty,
    RemoveFakeHeaders, RemoveHidden, RemoveWidgetState, SymbolIndex, TreatBackticks,
};

/// The transform stages for one document.
pub struct DocumentPipeline {
    /// Filters and injections over the whole cell list.
    pub cell_list: CellListPipeline,
    /// Per-cell rewrites, run after the list stage.
    pub cells: CellPipeline,
    /// Per-cell cleanup run after execution.
    pub post_execute: CellPipeline,
}

impl DocumentPipeline {
    /// Stage names in execution order, for inspection.
    pub fn stage_names(&self) -> Vec<&str> {
        let mut names = self.cell_list.transform_names();
        names.extend(self.cells.transform_names());
        names.extend(self.post_execute.transform_names());
        names
    }
}

/// Inputs for building the HTML pipeline of one notebook.
pub struct HtmlPipelineOptions {
    /// Notebook being converted; images resolve against its directory.
    pub fname: PathBuf,
    /// Documentation directory receiving copied images.
    pub doc_dir: PathBuf,
    pub doc_baseurl: String,
    pub jekyll: bool,
    /// Class heading level for injected `show_doc` cells.
    pub class_level: u32,
    pub index: Arc<dyn SymbolIndex>,
}

pub fn build_html_pipeline(options: HtmlPipelineOptions) -> DocumentPipeline {
    let mut cell_list = CellListPipeline::new();
    cell_list.push(Box::new(RemoveFakeHeaders));
    cell_list.push(Box::new(RemoveHidden));
    cell_list.push(Box::new(RemoveEmpty));
    cell_list.push(Box::new(AddShowDocs::new(options.class_level)));

    let mut cells = CellPipeline::new();
    cells.push(Box::new(CopyImages::new(
        options.fname,
        options.doc_dir,
        options.doc_baseurl,
        options.jekyll,
    )));
    cells.push(Box::new(HideCells));
    cells.push(Box::new(RemoveWidgetState));
    cells.push(Box::new(AddJekyllNotes));
    cells.push(Box::new(TreatBackticks::new(options.index)));

    let mut post_execute = CellPipeline::new();
    post_execute.push(Box::new(CleanExports));

    DocumentPipeline {
        cell_list,
        cells,
        post_execute,
    }
}

pub fn build_markdown_pipeline(fname: &Path, dest: &Path, jekyll: bool) -> DocumentPipeline {
    let mut cell_list = CellListPipeline::new();
    cell_list.push(Box::new(RemoveFakeHeaders));
    cell_list.push(Box::new(RemoveHidden));
    cell_list.push(Box::new(RemoveEmpty));

    let mut cells = CellPipeline::new();
    cells.push(Box::new(AdaptImgPath::new(fname, dest, jekyll)));
    cells.push(Box::new(HideCells));
    cells.push(Box::new(RemoveWidgetState));
    cells.push(Box::new(AddJekyllNotes));

    DocumentPipeline {
        cell_list,
        cells,
        post_execute: CellPipeline::new(),
    }
}
