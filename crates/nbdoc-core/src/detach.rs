/*
 * detach.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Moving pasted cell attachments out of a notebook.
 */

//! Attachment detachment.
//!
//! Images pasted into markdown cells are stored inside the notebook as
//! base64 attachments and referenced as `attachment:image.png`. Detaching
//! writes each cell's first attachment to `att_NNNNN.<ext>` (the first free
//! index) and points the reference at that file.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::Result;
use crate::error::NbdocError;
use crate::notebook::{Cell, Notebook};
use crate::patterns::ATTACHMENT_TOKEN;

/// Highest attachment index tried before giving up.
const MAX_ATTACHMENTS: u32 = 99_999;

/// Default attachment directory for a notebook: `<stem>_files`.
pub fn default_attachment_dir(path_nb: &Path) -> PathBuf {
    let stem = path_nb
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    PathBuf::from(format!("{}_files", stem))
}

fn free_path(dest: &Path, ext: &str) -> Result<PathBuf> {
    (0..MAX_ATTACHMENTS)
        .map(|i| dest.join(format!("att_{:05}.{}", i, ext)))
        .find(|p| !p.exists())
        .ok_or_else(|| NbdocError::other(format!("No free attachment name in {}", dest.display())))
}

/// Write the first attachment of `cell` into `dest` and point the cell's
/// `attachment:image.png` reference at it. The cell loses its attachments.
fn detach_cell(cell: &mut Cell, dest: &Path) -> Result<PathBuf> {
    let attachments = cell.attachments.take().unwrap_or_default();
    let (mime, payload) = attachments
        .values()
        .next()
        .and_then(Value::as_object)
        .and_then(|bundle| bundle.iter().next())
        .ok_or_else(|| NbdocError::other("Cell attachment has no content"))?;
    let payload = payload
        .as_str()
        .ok_or_else(|| NbdocError::other(format!("Attachment {} is not base64 text", mime)))?;
    let ext = mime.split('/').nth(1).unwrap_or("bin");

    let bytes = STANDARD
        .decode(payload.split_whitespace().collect::<String>())
        .map_err(|e| NbdocError::other(format!("Invalid attachment data: {}", e)))?;
    let path = free_path(dest, ext)?;
    fs::write(&path, bytes)?;

    cell.source = cell
        .source
        .replace(ATTACHMENT_TOKEN, &path.display().to_string());
    Ok(path)
}

/// Export the cell attachments of the notebook at `path_nb` to `dest`
/// (default `<stem>_files`) and update their references.
///
/// With `replace`, the notebook file is rewritten when anything was
/// detached and `None` is returned. Otherwise the file is left alone and the
/// updated notebook is returned.
pub fn nb_detach_cells(
    path_nb: &Path,
    dest: Option<&Path>,
    replace: bool,
) -> Result<Option<Notebook>> {
    let dest = dest
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_attachment_dir(path_nb));
    fs::create_dir_all(&dest)?;

    let mut notebook = Notebook::read(path_nb)?;
    let mut detached = Vec::new();
    for cell in notebook.cells.iter_mut().filter(|c| c.attachments.is_some()) {
        detached.push(detach_cell(cell, &dest)?);
    }
    tracing::debug!(notebook = %path_nb.display(), count = detached.len(), "Detached attachments");

    if !replace {
        return Ok(Some(notebook));
    }
    if !detached.is_empty() {
        notebook.write(path_nb)?;
    }
    Ok(None)
}
