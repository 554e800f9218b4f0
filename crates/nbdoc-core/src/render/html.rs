/*
 * render/html.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * HTML markup for cells and outputs.
 */

use once_cell::sync::Lazy;
use pulldown_cmark::{Options, Parser};
use regex::Regex;
use serde_json::Value;

use super::{CellView, error_text, multiline_text};
use crate::notebook::{Cell, CellType, Notebook};

/// Liquid tags (`{% ... %}`) that must reach the page untouched.
static LIQUID_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{%.*?%\}").expect("valid regex"));

static LIQUID_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"nbdocliquid(\d+)x").expect("valid regex"));

/// Mime types tried for rich outputs, most preferred first.
const MIME_ORDER: &[&str] = &[
    "text/html",
    "image/svg+xml",
    "image/png",
    "image/jpeg",
    "text/markdown",
    "text/latex",
    "text/plain",
];

fn escape_html(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Convert markdown to HTML, passing Liquid tags through as written.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut tags: Vec<String> = Vec::new();
    let protected = LIQUID_TAG.replace_all(markdown, |caps: &regex::Captures| {
        tags.push(caps[0].to_string());
        format!("nbdocliquid{}x", tags.len() - 1)
    });

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(&protected, options);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);

    if tags.is_empty() {
        return html;
    }
    LIQUID_PLACEHOLDER
        .replace_all(&html, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| tags.get(i).cloned())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub(crate) fn cell_views(notebook: &Notebook) -> Vec<CellView> {
    notebook.cells.iter().map(cell_view).collect()
}

fn cell_view(cell: &Cell) -> CellView {
    match cell.cell_type {
        CellType::Markdown => CellView {
            kind: "markdown",
            show_input: true,
            body: markdown_to_html(&cell.source),
            outputs: Vec::new(),
        },
        CellType::Code => CellView {
            kind: "code",
            show_input: !cell.hides_input(),
            body: escape_html(&cell.source),
            outputs: cell.outputs.iter().filter_map(output_html).collect(),
        },
        CellType::Raw => CellView {
            kind: "raw",
            show_input: true,
            body: cell.source.clone(),
            outputs: Vec::new(),
        },
    }
}

fn output_html(output: &Value) -> Option<String> {
    match output.get("output_type").and_then(Value::as_str)? {
        "stream" => {
            let name = output.get("name").and_then(Value::as_str).unwrap_or("stdout");
            let text = multiline_text(output.get("text")?);
            Some(format!(
                "<div class=\"output_subarea output_stream output_{} output_text\">\n<pre>{}</pre>\n</div>",
                name,
                escape_html(&text)
            ))
        }
        "execute_result" | "display_data" => rich_output_html(output.get("data")?),
        "error" => Some(format!(
            "<div class=\"output_subarea output_text output_error\">\n<pre>{}</pre>\n</div>",
            escape_html(&error_text(output))
        )),
        _ => None,
    }
}

fn rich_output_html(data: &Value) -> Option<String> {
    let (mime, value) = MIME_ORDER
        .iter()
        .find_map(|&mime| data.get(mime).map(|v| (mime, v)))?;
    let content = multiline_text(value);
    let html = match mime {
        "text/html" => format!(
            "<div class=\"output_html rendered_html output_subarea\">\n{}\n</div>",
            content
        ),
        "image/svg+xml" => format!("<div class=\"output_svg output_subarea\">\n{}\n</div>", content),
        "image/png" | "image/jpeg" => {
            let payload: String = content.split_whitespace().collect();
            let class = if mime == "image/png" { "png" } else { "jpeg" };
            format!(
                "<div class=\"output_{} output_subarea\">\n<img src=\"data:{};base64,{}\">\n</div>",
                class, mime, payload
            )
        }
        "text/markdown" => format!(
            "<div class=\"output_markdown rendered_html output_subarea\">\n{}\n</div>",
            markdown_to_html(&content)
        ),
        _ => format!(
            "<div class=\"output_text output_subarea\">\n<pre>{}</pre>\n</div>",
            escape_html(&content)
        ),
    };
    Some(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_markdown_keeps_liquid_tags() {
        let html = markdown_to_html("Intro\n\n{% include tip.html content='don&#8217;t' %}");
        assert!(html.contains("<p>Intro</p>"));
        assert!(html.contains("{% include tip.html content='don&#8217;t' %}"));
    }

    #[test]
    fn test_plain_markdown() {
        assert_eq!(markdown_to_html("# Head"), "<h1>Head</h1>\n");
    }

    #[test]
    fn test_rich_output_prefers_html() {
        let data = json!({"text/plain": "df", "text/html": "<table></table>"});
        let html = rich_output_html(&data).unwrap();
        assert!(html.contains("<table></table>"));
        assert!(!html.contains("df"));
    }

    #[test]
    fn test_png_output_is_inlined() {
        let data = json!({"image/png": "aGVs\nbG8=\n"});
        let html = rich_output_html(&data).unwrap();
        assert!(html.contains("src=\"data:image/png;base64,aGVsbG8=\""));
    }

    #[test]
    fn test_unknown_output_type_is_skipped() {
        assert!(output_html(&json!({"output_type": "unknown"})).is_none());
    }
}
