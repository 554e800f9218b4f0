/*
 * render/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Notebook rendering to HTML and Markdown pages.
 */

//! Notebook rendering.
//!
//! A [`NotebookExporter`] turns a processed notebook and its page metadata
//! into page text plus any binary files the page references. The built-in
//! [`TemplateExporter`] renders through embedded templates:
//!
//! | Format | Template |
//! |--------|----------|
//! | [`ExportFormat::Html`] | `jekyll.html` |
//! | [`ExportFormat::Markdown`] (Jekyll) | `jekyll-md.md` |
//! | [`ExportFormat::Markdown`] (plain) | `md.md` |
//!
//! Cell markup is prepared in Rust ([`html`], [`markdown`]) and the
//! templates only lay it out.

mod html;
mod markdown;

use hashlink::LinkedHashMap;
use minijinja::{AutoEscape, Environment, context};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::Result;
use crate::error::NbdocError;
use crate::notebook::Notebook;
use crate::patterns::{RENDERED_PNG, RENDERED_SVG};
use crate::transforms::ResourceMetadata;

pub use html::markdown_to_html;

const JEKYLL_HTML: &str = include_str!("../../resources/templates/jekyll.html");
const JEKYLL_MD: &str = include_str!("../../resources/templates/jekyll-md.md");
const PLAIN_MD: &str = include_str!("../../resources/templates/md.md");

/// Front matter keys written first, in this order.
const FRONT_MATTER_KEYS: &[&str] = &["title", "keywords", "summary", "description", "nb_path"];

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid regex"));

/// Output page format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Markdown { jekyll: bool },
}

impl ExportFormat {
    pub fn template_name(&self) -> &'static str {
        match self {
            ExportFormat::Html => "jekyll.html",
            ExportFormat::Markdown { jekyll: true } => "jekyll-md.md",
            ExportFormat::Markdown { jekyll: false } => "md.md",
        }
    }

    /// File extension of pages in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Markdown { .. } => "md",
        }
    }
}

/// A rendered page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOutput {
    pub text: String,
    /// Binary files referenced from `text`, by file name, in creation order.
    pub outputs: LinkedHashMap<String, Vec<u8>>,
}

/// Renders a processed notebook into a page.
pub trait NotebookExporter: Send + Sync {
    fn export(&self, notebook: &Notebook, meta: &ResourceMetadata) -> Result<ExportOutput>;
}

/// What the templates see for one cell.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CellView {
    kind: &'static str,
    show_input: bool,
    /// Rendered input: HTML for the HTML target, text for Markdown.
    body: String,
    outputs: Vec<String>,
}

/// Exporter backed by the embedded page templates.
pub struct TemplateExporter {
    format: ExportFormat,
    env: Environment<'static>,
}

impl TemplateExporter {
    pub fn new(format: ExportFormat) -> Result<Self> {
        let mut env = Environment::new();
        // Cell markup is escaped before it reaches the template.
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_template("jekyll.html", JEKYLL_HTML)?;
        env.add_template("jekyll-md.md", JEKYLL_MD)?;
        env.add_template("md.md", PLAIN_MD)?;
        Ok(Self { format, env })
    }

    pub fn html() -> Result<Self> {
        Self::new(ExportFormat::Html)
    }

    pub fn markdown(jekyll: bool) -> Result<Self> {
        Self::new(ExportFormat::Markdown { jekyll })
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }
}

impl NotebookExporter for TemplateExporter {
    fn export(&self, notebook: &Notebook, meta: &ResourceMetadata) -> Result<ExportOutput> {
        let language = notebook_language(notebook);
        let mut outputs = LinkedHashMap::new();
        let cells = match self.format {
            ExportFormat::Html => html::cell_views(notebook),
            ExportFormat::Markdown { .. } => {
                markdown::cell_views(notebook, &language, &mut outputs)?
            }
        };

        let template = self.env.get_template(self.format.template_name())?;
        let text = template.render(context! {
            front_matter => front_matter(meta)?,
            nb_path => meta.get("nb_path").unwrap_or_default(),
            title => meta.title(),
            summary => meta.summary(),
            language => language,
            cells => cells,
        })?;

        tracing::debug!(
            template = self.format.template_name(),
            cells = notebook.cells.len(),
            files = outputs.len(),
            "Rendered notebook"
        );
        Ok(ExportOutput { text, outputs })
    }
}

/// Front matter lines as `(key, quoted value)` pairs.
fn front_matter(meta: &ResourceMetadata) -> Result<Vec<(String, String)>> {
    let quote = |value: &str| {
        serde_json::to_string(value)
            .map_err(|e| NbdocError::render(format!("Failed to quote front matter: {}", e)))
    };

    let mut lines = Vec::new();
    for &key in FRONT_MATTER_KEYS {
        let value = match key {
            "description" => meta.get("description").unwrap_or(meta.summary()),
            _ => match meta.get(key) {
                Some(value) => value,
                None => continue,
            },
        };
        lines.push((key.to_string(), quote(value)?));
    }
    lines.insert(2.min(lines.len()), ("sidebar".to_string(), "home_sidebar".to_string()));

    for (key, value) in meta.iter() {
        if !FRONT_MATTER_KEYS.contains(&key) {
            lines.push((key.to_string(), quote(value)?));
        }
    }
    Ok(lines)
}

/// Language of the notebook's code cells, for syntax classes and fences.
fn notebook_language(notebook: &Notebook) -> String {
    notebook
        .metadata
        .get("language_info")
        .and_then(|info| info.get("name"))
        .or_else(|| {
            notebook
                .metadata
                .get("kernelspec")
                .and_then(|k| k.get("language"))
        })
        .and_then(Value::as_str)
        .unwrap_or("python")
        .to_string()
}

/// Text of a notebook field stored either as a string or a list of lines.
pub(crate) fn multiline_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(lines) => lines.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

/// Traceback of an `error` output, without terminal color codes.
pub(crate) fn error_text(output: &Value) -> String {
    let traceback = output
        .get("traceback")
        .and_then(Value::as_array)
        .map(|lines| {
            lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| {
            let ename = output.get("ename").and_then(Value::as_str).unwrap_or("Error");
            let evalue = output.get("evalue").and_then(Value::as_str).unwrap_or("");
            format!("{}: {}", ename, evalue)
        });
    ANSI_ESCAPE.replace_all(&traceback, "").into_owned()
}

/// Point the `![png](...)` and `![svg](...)` references of a Markdown page
/// at `img_path`.
pub fn prefix_image_paths(text: &str, img_path: &str) -> String {
    let text = RENDERED_PNG.replace_all(text, |caps: &regex::Captures| {
        format!("![png]({}{})", img_path, &caps[1])
    });
    RENDERED_SVG
        .replace_all(&text, |caps: &regex::Captures| {
            format!("![svg]({}{})", img_path, &caps[1])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::Cell;
    use serde_json::json;

    fn meta() -> ResourceMetadata {
        let mut meta = ResourceMetadata::defaults();
        meta.set("title", "Core");
        meta.set("summary", "Basic \"helpers\"");
        meta.set("nb_path", "nbs/00_core.ipynb");
        meta.set("Author", "Jane");
        meta
    }

    #[test]
    fn test_template_names() {
        assert_eq!(ExportFormat::Html.template_name(), "jekyll.html");
        assert_eq!(
            ExportFormat::Markdown { jekyll: true }.template_name(),
            "jekyll-md.md"
        );
        assert_eq!(ExportFormat::Markdown { jekyll: false }.extension(), "md");
    }

    #[test]
    fn test_front_matter() {
        let lines = front_matter(&meta()).unwrap();
        let keys: Vec<&str> = lines.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["title", "keywords", "sidebar", "summary", "description", "nb_path", "Author"]
        );
        assert_eq!(lines[3].1, r#""Basic \"helpers\"""#);
        assert_eq!(lines[4].1, lines[3].1);
    }

    #[test]
    fn test_html_export() {
        let mut code = Cell::code("print('hi')");
        code.outputs = vec![json!({"output_type": "stream", "name": "stdout", "text": ["hi\n"]})];
        let mut hidden = Cell::code("#export\ndef f(): pass");
        hidden.metadata.insert("hide_input".into(), json!(true));
        let notebook = Notebook::from_cells(vec![
            Cell::markdown("Some *text*\n\n{% include note.html content='x' %}"),
            code,
            hidden,
        ]);

        let output = TemplateExporter::html().unwrap().export(&notebook, &meta()).unwrap();
        let text = &output.text;
        assert!(text.starts_with("---\ntitle: \"Core\"\n"));
        assert!(text.contains("sidebar: home_sidebar\n"));
        assert!(text.contains("# file to edit: nbs/00_core.ipynb"));
        assert!(text.contains("<em>text</em>"));
        assert!(text.contains("{% include note.html content='x' %}"));
        assert!(text.contains("print(&#39;hi&#39;)"));
        assert!(text.contains("<pre>hi\n</pre>"));
        assert!(!text.contains("def f(): pass"));
        assert!(output.outputs.is_empty());
    }

    #[test]
    fn test_markdown_export_extracts_images() {
        let mut plot = Cell::code("plot()");
        plot.outputs = vec![json!({
            "output_type": "display_data",
            "data": {"image/png": "aGVsbG8=\n", "text/plain": "<Figure>"},
            "metadata": {}
        })];
        let notebook = Notebook::from_cells(vec![Cell::markdown("Intro"), plot]);

        let output = TemplateExporter::markdown(false)
            .unwrap()
            .export(&notebook, &meta())
            .unwrap();
        assert!(output.text.starts_with("# Core\n> Basic \"helpers\"\n"));
        assert!(output.text.contains("```python\nplot()\n```"));
        assert!(output.text.contains("![png](output_1_0.png)"));
        assert_eq!(output.outputs.get("output_1_0.png"), Some(&b"hello".to_vec()));
    }

    #[test]
    fn test_prefix_image_paths() {
        let md = "![png](output_1_0.png)\ntext\n![svg](output_2_0.svg)";
        assert_eq!(
            prefix_image_paths(md, "docs/images/"),
            "![png](docs/images/output_1_0.png)\ntext\n![svg](docs/images/output_2_0.svg)"
        );
    }

    #[test]
    fn test_error_text_strips_colors() {
        let output = json!({
            "output_type": "error",
            "ename": "ValueError",
            "evalue": "bad",
            "traceback": ["\u{1b}[0;31mValueError\u{1b}[0m: bad"]
        });
        assert_eq!(error_text(&output), "ValueError: bad");
    }

    #[test]
    fn test_multiline_text() {
        assert_eq!(multiline_text(&json!(["a\n", "b"])), "a\nb");
        assert_eq!(multiline_text(&json!("x")), "x");
        assert_eq!(multiline_text(&json!(null)), "");
    }
}
