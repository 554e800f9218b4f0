/*
 * transforms/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Cell transforms for the documentation pipeline.
 */

//! Cell transforms for the documentation pipeline.
//!
//! Per-cell transforms ([`CellTransform`](crate::transform::CellTransform)):
//!
//! - [`HideCells`] - Hides the input of exported and `show_doc` cells
//! - [`RemoveWidgetState`] - Drops interactive widget outputs
//! - [`CleanExports`] - Strips a leading `#exports` line
//! - [`TreatBackticks`] - Links backticked names to their documentation
//! - [`AddJekyllNotes`] - Turns `> Note: ...` quotes into callout includes
//! - [`CopyImages`] / [`AdaptImgPath`] - Rewrite image references
//!
//! Cell-list transforms ([`CellListTransform`](crate::transform::CellListTransform)):
//!
//! - [`RemoveFakeHeaders`], [`RemoveHidden`], [`RemoveEmpty`] - Drop cells
//! - [`AddShowDocs`] - Injects `show_doc` cells for exported names
//!
//! The free functions of the same names operate directly on cells and are
//! what the transform structs call.

mod backticks;
mod cells;
mod filter;
mod images;
mod metadata;
mod notes;
mod show_doc;

pub use backticks::{DocIndex, SymbolIndex, TreatBackticks, add_doc_links, treat_backticks};
pub use cells::{
    CleanExports, HideCells, RemoveWidgetState, clean_exports, hide_cells, remove_widget_state,
};
pub use filter::{
    RemoveEmpty, RemoveFakeHeaders, RemoveHidden, remove_empty, remove_fake_headers,
    remove_hidden,
};
pub use images::{AdaptImgPath, CopyImages, adapt_img_path, copy_images, img2jkl};
pub use metadata::{ResourceMetadata, find_default_export, get_metadata};
pub use notes::{AddJekyllNotes, NOTE_STYLES, add_jekyll_notes};
pub use show_doc::{
    AddShowDocs, DEFAULT_CLASS_LEVEL, ExportNames, PythonExportNames, add_show_docs,
    find_default_level, show_doc_cell,
};
