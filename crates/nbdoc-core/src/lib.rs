//! Notebook to documentation conversion
//!
//! This crate turns Jupyter notebooks into documentation pages (Jekyll
//! flavoured HTML or Markdown) and powers the `nbdoc` CLI.
//!
//! # Architecture
//!
//! A conversion is organized around these key types:
//!
//! - [`DocConfig`] - Project settings read from `nbdoc.yml`
//! - [`Notebook`] / [`Cell`] - The document being converted
//! - [`DocumentPipeline`] - Ordered cell-list and per-cell transforms
//! - [`CellEvaluator`] - Runs the `show_doc` and import cells
//! - [`NotebookExporter`] - Renders the final page through a template
//! - [`ConvertContext`] - Shared state for converting many notebooks
//!
//! # Example
//!
//! ```ignore
//! use nbdoc_core::{BatchOptions, ConvertContext, DocConfig, notebook2html};
//!
//! let config = DocConfig::discover(".")?;
//! let ctx = ConvertContext::new(config)?;
//! let report = notebook2html(&ctx, &BatchOptions::default())?;
//! println!("{} pages written", report.succeeded());
//! ```

pub mod attrs;
pub mod batch;
pub mod config;
pub mod convert;
pub mod detach;
pub mod discovery;
pub mod error;
pub mod execute;
pub mod notebook;
pub mod patterns;
pub mod pipeline;
pub mod render;
pub mod templates;
pub mod transform;
pub mod transforms;

// Re-export commonly used types
pub use attrs::TagAttrs;
pub use batch::{BatchOptions, BatchReport, DocumentResult, convert_all, notebook2html};
pub use config::{CONFIG_FILE_NAME, DocConfig};
pub use convert::{
    ConvertContext, MarkdownOptions, convert_md, convert_nb, nb2html_fname, output_name,
};
pub use detach::nb_detach_cells;
pub use discovery::{Discovery, discover};
pub use error::{NbdocError, Result};
pub use execute::{
    CellEvaluator, EvaluatedCell, ExecutionError, NbconvertEvaluator, NoopEvaluator, execute_nb,
};
pub use notebook::{Cell, CellType, Notebook};
pub use pipeline::{DocumentPipeline, HtmlPipelineOptions, build_html_pipeline, build_markdown_pipeline};
pub use render::{ExportFormat, ExportOutput, NotebookExporter, TemplateExporter};
pub use templates::write_tmpls;
pub use transform::{CellListPipeline, CellListTransform, CellPipeline, CellTransform};
pub use transforms::{DocIndex, ResourceMetadata, SymbolIndex};
