/*
 * transforms/notes.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Block-quote notes to Jekyll callout includes.
 */

//! Callout conversion for block-quote notes.
//!
//! A markdown line such as
//!
//! ```markdown
//! > Warning: don't call this twice
//! ```
//!
//! becomes the Jekyll include
//!
//! ```text
//! {% include warning.html content='don&#8217;t call this twice' %}
//! ```
//!
//! Only the styles in [`NOTE_STYLES`] are converted; quotes with any other
//! title are left exactly as written.

use regex::Captures;

use crate::Result;
use crate::notebook::Cell;
use crate::patterns::BLOCK_NOTE;
use crate::transform::CellTransform;

/// Callout styles understood by the site theme.
pub const NOTE_STYLES: &[&str] = &["note", "warning", "tip", "important"];

/// Escape note text for use inside a single-quoted include argument.
fn to_html(text: &str) -> String {
    text.replace('\'', "&#8217;")
}

/// Rewrite `> Title: text` quotes in markdown cells as callout includes.
pub fn add_jekyll_notes(cell: &mut Cell) {
    if !cell.is_markdown() {
        return;
    }
    let rewritten = BLOCK_NOTE.replace_all(&cell.source, |caps: &Captures| {
        let title = &caps[1];
        let text = &caps[2];
        let style = title.to_lowercase();
        if NOTE_STYLES.contains(&style.as_str()) {
            format!("{{% include {}.html content='{}' %}}", style, to_html(text))
        } else {
            caps[0].to_string()
        }
    });
    cell.source = rewritten.into_owned();
}

pub struct AddJekyllNotes;

impl CellTransform for AddJekyllNotes {
    fn name(&self) -> &str {
        "add-jekyll-notes"
    }

    fn transform(&self, cell: &mut Cell) -> Result<()> {
        add_jekyll_notes(cell);
        Ok(())
    }
}
