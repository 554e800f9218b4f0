/*
 * convert.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Single-notebook conversion to HTML and Markdown pages.
 */

//! Single-document conversion.
//!
//! [`convert_nb`] builds one HTML documentation page:
//!
//! 1. Read the notebook and take its title cell as page metadata
//! 2. Find the default class level and the default export module
//! 3. Run the cell-list and per-cell transforms
//! 4. Execute `show_doc` and library-import cells
//! 5. Strip `#exports` lines
//! 6. Render and write the page
//!
//! [`convert_md`] does the same for a Markdown page without execution, and
//! writes the images extracted from outputs next to it.
//!
//! Pages are rendered completely in memory and then written through a
//! temporary file in the destination directory, so a failed conversion never
//! leaves a partial page behind.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::Result;
use crate::config::DocConfig;
use crate::execute::{CellEvaluator, NbconvertEvaluator, execute_nb};
use crate::notebook::Notebook;
use crate::patterns::strip_digit_prefix;
use crate::pipeline::{HtmlPipelineOptions, build_html_pipeline, build_markdown_pipeline};
use crate::render::{ExportFormat, NotebookExporter, TemplateExporter, prefix_image_paths};
use crate::transforms::{
    DocIndex, ResourceMetadata, SymbolIndex, find_default_export, find_default_level,
    get_metadata,
};

/// Default image directory for Markdown conversion, relative to its
/// destination.
pub const DEFAULT_IMG_PATH: &str = "docs/images/";

/// Everything needed to convert notebooks to HTML pages.
///
/// The context is shared by every worker of a batch.
#[derive(Clone)]
pub struct ConvertContext {
    pub config: DocConfig,
    pub evaluator: Arc<dyn CellEvaluator>,
    pub exporter: Arc<dyn NotebookExporter>,
    pub index: Arc<dyn SymbolIndex>,
    /// Output directory; the configured documentation directory when unset.
    pub dest: Option<PathBuf>,
}

impl ConvertContext {
    /// Context with the nbconvert evaluator, the HTML exporter and the
    /// configured symbol index.
    pub fn new(config: DocConfig) -> Result<Self> {
        let evaluator =
            NbconvertEvaluator::new(&config.kernel_name).with_working_dir(config.nbs_dir());
        let index: Arc<dyn SymbolIndex> = match config.doc_index_path() {
            Some(path) => Arc::new(DocIndex::load(&path, &config.doc_baseurl)?),
            None => Arc::new(DocIndex::empty()),
        };
        Ok(Self {
            config,
            evaluator: Arc::new(evaluator),
            exporter: Arc::new(TemplateExporter::html()?),
            index,
            dest: None,
        })
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn CellEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn NotebookExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn with_index(mut self, index: Arc<dyn SymbolIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn with_dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Directory HTML pages are written to.
    pub fn dest_dir(&self) -> PathBuf {
        self.dest.clone().unwrap_or_else(|| self.config.doc_dir())
    }
}

/// Page file name for a notebook: ordering prefix removed, extension
/// replaced.
pub fn output_name(nb_path: &Path, format: ExportFormat) -> String {
    let name = nb_path.with_extension(format.extension());
    let name = name
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_digit_prefix(&name).to_string()
}

/// HTML page path for a notebook inside `dest`.
pub fn nb2html_fname(nb_path: &Path, dest: &Path) -> PathBuf {
    dest.join(output_name(nb_path, ExportFormat::Html))
}

/// Notebook path as recorded in page metadata: relative to the project
/// directory when inside it.
fn nb_path_for(fname: &Path, config: &DocConfig) -> String {
    let relative = std::path::absolute(&config.project_dir)
        .ok()
        .and_then(|root| pathdiff::diff_paths(fname, root))
        .filter(|p| !p.components().any(|c| c == Component::ParentDir));
    match relative {
        Some(path) => path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        None => fname.display().to_string(),
    }
}

fn read_with_metadata(fname: &Path, config: &DocConfig) -> Result<(Notebook, ResourceMetadata)> {
    let mut notebook = Notebook::read(fname)?;
    let mut meta = get_metadata(&mut notebook.cells);
    meta.set("nb_path", nb_path_for(fname, config));
    Ok((notebook, meta))
}

/// Write `contents` to `path` through a temporary file in the same
/// directory.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Convert the notebook `fname` to an HTML page. Returns the page path.
pub fn convert_nb(fname: &Path, ctx: &ConvertContext) -> Result<PathBuf> {
    let fname = std::path::absolute(fname)?;
    let config = &ctx.config;
    let (mut notebook, meta) = read_with_metadata(&fname, config)?;

    let class_level = find_default_level(&notebook.cells);
    let module = find_default_export(&notebook.cells);

    let pipeline = build_html_pipeline(HtmlPipelineOptions {
        fname: fname.clone(),
        doc_dir: config.doc_dir(),
        doc_baseurl: config.doc_baseurl.clone(),
        jekyll: config.jekyll,
        class_level,
        index: ctx.index.clone(),
    });
    pipeline.cell_list.execute(&mut notebook.cells)?;
    pipeline.cells.execute(&mut notebook.cells)?;

    execute_nb(&mut notebook, module.as_deref(), config, ctx.evaluator.as_ref())?;
    pipeline.post_execute.execute(&mut notebook.cells)?;

    let output = ctx.exporter.export(&notebook, &meta)?;
    let dest = nb2html_fname(&fname, &ctx.dest_dir());
    write_atomic(&dest, output.text.as_bytes())?;
    Ok(dest)
}

/// Options for [`convert_md`].
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Directory the page is written to.
    pub dest: PathBuf,
    /// Directory for extracted images, relative to `dest`. Empty means
    /// `<notebook stem>_files/`.
    pub img_path: String,
    pub jekyll: bool,
}

impl MarkdownOptions {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            img_path: DEFAULT_IMG_PATH.to_string(),
            jekyll: true,
        }
    }
}

/// Convert the notebook `fname` to a Markdown page. Returns the page path.
pub fn convert_md(fname: &Path, options: &MarkdownOptions, config: &DocConfig) -> Result<PathBuf> {
    let fname = std::path::absolute(fname)?;
    let img_path = if options.img_path.is_empty() {
        let stem = fname
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}_files/", stem)
    } else {
        options.img_path.clone()
    };
    let img_dir = options.dest.join(&img_path);
    fs::create_dir_all(&img_dir)?;

    let (mut notebook, meta) = read_with_metadata(&fname, config)?;
    let pipeline = build_markdown_pipeline(&fname, &options.dest, options.jekyll);
    pipeline.cell_list.execute(&mut notebook.cells)?;
    pipeline.cells.execute(&mut notebook.cells)?;

    let exporter = TemplateExporter::markdown(options.jekyll)?;
    let output = exporter.export(&notebook, &meta)?;
    let text = prefix_image_paths(&output.text, &img_path);

    let dest = options
        .dest
        .join(output_name(&fname, ExportFormat::Markdown { jekyll: options.jekyll }));
    write_atomic(&dest, text.as_bytes())?;
    for (name, bytes) in &output.outputs {
        fs::write(img_dir.join(name), bytes)?;
    }
    Ok(dest)
}

/// Convert one notebook to HTML, logging the outcome with its file name.
pub fn convert_one(fname: &Path, ctx: &ConvertContext) -> Result<PathBuf> {
    tracing::info!(notebook = %fname.display(), "Converting");
    match convert_nb(fname, ctx) {
        Ok(dest) => {
            tracing::debug!(notebook = %fname.display(), output = %dest.display(), "Converted");
            Ok(dest)
        }
        Err(e) => {
            tracing::error!(notebook = %fname.display(), error = %e, "Conversion failed");
            Err(e)
        }
    }
}
