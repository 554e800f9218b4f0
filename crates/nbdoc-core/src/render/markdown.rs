/*
 * render/markdown.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Markdown text for cells and outputs.
 */

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hashlink::LinkedHashMap;
use serde_json::Value;

use super::{CellView, error_text, multiline_text};
use crate::Result;
use crate::error::NbdocError;
use crate::notebook::{Cell, CellType, Notebook};

/// Image mime types extracted to files, with their extensions.
const IMAGE_MIMES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpeg"),
    ("image/svg+xml", "svg"),
];

/// Cell views for a Markdown page. Image outputs are decoded into `files`
/// under `output_<cell>_<n>.<ext>` names.
pub(crate) fn cell_views(
    notebook: &Notebook,
    language: &str,
    files: &mut LinkedHashMap<String, Vec<u8>>,
) -> Result<Vec<CellView>> {
    notebook
        .cells
        .iter()
        .enumerate()
        .map(|(index, cell)| cell_view(index, cell, language, files))
        .collect()
}

fn cell_view(
    index: usize,
    cell: &Cell,
    language: &str,
    files: &mut LinkedHashMap<String, Vec<u8>>,
) -> Result<CellView> {
    let view = match cell.cell_type {
        CellType::Markdown => CellView {
            kind: "markdown",
            show_input: true,
            body: cell.source.clone(),
            outputs: Vec::new(),
        },
        CellType::Raw => CellView {
            kind: "raw",
            show_input: true,
            body: cell.source.clone(),
            outputs: Vec::new(),
        },
        CellType::Code => {
            let show_input = !cell.hides_input();
            let mut outputs = Vec::new();
            for (n, output) in cell.outputs.iter().enumerate() {
                if let Some(text) = output_markdown(index, n, output, files)? {
                    outputs.push(text);
                }
            }
            let mut parts = Vec::new();
            if show_input {
                parts.push(format!("```{}\n{}\n```", language, cell.source));
            }
            parts.extend(outputs.iter().cloned());
            CellView {
                kind: "code",
                show_input,
                body: parts.join("\n\n"),
                outputs,
            }
        }
    };
    Ok(view)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn output_markdown(
    cell: usize,
    n: usize,
    output: &Value,
    files: &mut LinkedHashMap<String, Vec<u8>>,
) -> Result<Option<String>> {
    let Some(output_type) = output.get("output_type").and_then(Value::as_str) else {
        return Ok(None);
    };
    let text = match output_type {
        "stream" => output.get("text").map(|t| indent(&multiline_text(t))),
        "error" => Some(indent(&error_text(output))),
        "execute_result" | "display_data" => match output.get("data") {
            Some(data) => rich_output_markdown(cell, n, data, files)?,
            None => None,
        },
        _ => None,
    };
    Ok(text)
}

fn rich_output_markdown(
    cell: usize,
    n: usize,
    data: &Value,
    files: &mut LinkedHashMap<String, Vec<u8>>,
) -> Result<Option<String>> {
    for &(mime, ext) in IMAGE_MIMES {
        let Some(value) = data.get(mime) else {
            continue;
        };
        let content = multiline_text(value);
        let bytes = if mime == "image/svg+xml" {
            content.into_bytes()
        } else {
            let payload: String = content.split_whitespace().collect();
            STANDARD.decode(payload).map_err(|e| {
                NbdocError::render(format!("Invalid {} output in cell {}: {}", mime, cell, e))
            })?
        };
        let name = format!("output_{}_{}.{}", cell, n, ext);
        let reference = format!("![{}]({})", ext, name);
        files.insert(name, bytes);
        return Ok(Some(reference));
    }

    if let Some(html) = data.get("text/html") {
        return Ok(Some(multiline_text(html)));
    }
    if let Some(markdown) = data.get("text/markdown") {
        return Ok(Some(multiline_text(markdown)));
    }
    Ok(data.get("text/plain").map(|t| indent(&multiline_text(t))))
}
