/*
 * transforms/metadata.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Page metadata taken from the notebook's title cell.
 */

//! Page metadata.
//!
//! A notebook opens with a markdown cell like
//!
//! ```markdown
//! # My Title
//!
//! > One-line summary
//!
//! - Author: Jane
//! ```
//!
//! [`get_metadata`] removes that cell and returns its title, summary and
//! property lines as the page's [`ResourceMetadata`].

use hashlink::LinkedHashMap;
use serde::Serialize;

use crate::notebook::Cell;
use crate::patterns;

pub const DEFAULT_KEYWORDS: &str = "fastai";
pub const DEFAULT_SUMMARY: &str = "summary";
pub const DEFAULT_TITLE: &str = "Title";

/// Ordered page metadata handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceMetadata {
    entries: LinkedHashMap<String, String>,
}

impl ResourceMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata for a notebook without a title cell.
    pub fn defaults() -> Self {
        Self::with_title(DEFAULT_TITLE, DEFAULT_SUMMARY)
    }

    fn with_title(title: &str, summary: &str) -> Self {
        let mut meta = Self::new();
        meta.set("keywords", DEFAULT_KEYWORDS);
        meta.set("summary", summary);
        meta.set("title", title);
        meta
    }

    /// Set `key`, keeping its position if already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.get_mut(&key) {
            Some(existing) => *existing = value,
            None => {
                self.entries.insert(key, value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn title(&self) -> &str {
        self.get("title").unwrap_or(DEFAULT_TITLE)
    }

    pub fn summary(&self) -> &str {
        self.get("summary").unwrap_or(DEFAULT_SUMMARY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extract page metadata from the first markdown cell that starts with a
/// `# Title` / `> summary` header, removing that cell from `cells`.
pub fn get_metadata(cells: &mut Vec<Cell>) -> ResourceMetadata {
    let found = cells.iter().enumerate().find_map(|(i, cell)| {
        if !cell.is_markdown() {
            return None;
        }
        let (title, summary) = patterns::title_summary(&cell.source)?;
        let mut meta = ResourceMetadata::with_title(title, summary);
        for (key, value) in patterns::properties(&cell.source) {
            meta.set(key, value);
        }
        Some((i, meta))
    });

    match found {
        Some((index, meta)) => {
            cells.remove(index);
            meta
        }
        None => ResourceMetadata::defaults(),
    }
}

/// Module named by the first `#default_exp` code cell.
pub fn find_default_export(cells: &[Cell]) -> Option<String> {
    cells
        .iter()
        .filter(|c| c.is_code())
        .find_map(|c| patterns::default_export(&c.source))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_title_cell() {
        let mut cells = vec![Cell::markdown("Just text"), Cell::code("# Title\n> code")];
        let meta = get_metadata(&mut cells);
        assert_eq!(
            meta.iter().collect::<Vec<_>>(),
            vec![("keywords", "fastai"), ("summary", "summary"), ("title", "Title")]
        );
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_title_cell_is_extracted_and_removed() {
        let mut cells = vec![
            Cell::code("#default_exp core"),
            Cell::markdown("# My Title\n\n> S\n\n- Author: Jane"),
            Cell::markdown("Body"),
        ];
        let meta = get_metadata(&mut cells);
        assert_eq!(meta.title(), "My Title");
        assert_eq!(meta.summary(), "S");
        assert_eq!(meta.get("keywords"), Some("fastai"));
        assert_eq!(meta.get("Author"), Some("Jane"));
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].source, "Body");
    }

    #[test]
    fn test_property_overrides_keep_position() {
        let mut cells = vec![Cell::markdown("# T\n> S\n- keywords: docs\n")];
        let meta = get_metadata(&mut cells);
        assert_eq!(
            meta.iter().collect::<Vec<_>>(),
            vec![("keywords", "docs"), ("summary", "S"), ("title", "T")]
        );
    }

    #[test]
    fn test_find_default_export() {
        let cells = vec![
            Cell::markdown("#default_exp wrong"),
            Cell::code("#default_exp data.core"),
        ];
        assert_eq!(find_default_export(&cells).as_deref(), Some("data.core"));
        assert_eq!(find_default_export(&[Cell::code("x")]), None);
    }
}
