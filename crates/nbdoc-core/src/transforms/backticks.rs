/*
 * transforms/backticks.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Documentation links for backticked names.
 */

//! Links backticked names in markdown to their documentation.
//!
//! `` `Foo` `` becomes ``[`Foo`](/docs/core#Foo)`` when the symbol index
//! knows `Foo`. An existing ``[`Foo`](old-link)`` is refreshed the same way,
//! and loses its stale link when `Foo` is no longer known.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::Result;
use crate::error::NbdocError;
use crate::notebook::Cell;
use crate::patterns::strip_digit_prefix;
use crate::transform::CellTransform;

/// ``[`name`](link)`` in groups 1, or a bare `` `name` `` in group 2.
static BACKTICKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[`([^`]*)`\](?:\([^)]*\))|`([^`]*)`").expect("valid regex")
});

/// Lookup from exported symbol names to documentation URLs.
pub trait SymbolIndex: Send + Sync {
    /// URL documenting `name`, if the symbol is known.
    fn doc_url(&self, name: &str) -> Option<String>;
}

/// Symbol index read from a JSON object mapping names to the notebook that
/// defines them, e.g. `{"Foo": "00_core.ipynb"}`.
#[derive(Debug, Clone, Default)]
pub struct DocIndex {
    entries: HashMap<String, String>,
    baseurl: String,
}

impl DocIndex {
    pub fn new(entries: HashMap<String, String>, baseurl: impl Into<String>) -> Self {
        Self {
            entries,
            baseurl: baseurl.into(),
        }
    }

    /// An index that knows no symbols.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path, baseurl: impl Into<String>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|source| NbdocError::Notebook {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), symbols = entries.len(), "Loaded symbol index");
        Ok(Self::new(entries, baseurl))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SymbolIndex for DocIndex {
    fn doc_url(&self, name: &str) -> Option<String> {
        let notebook = self.entries.get(name)?;
        let page = strip_digit_prefix(notebook);
        let page = Path::new(page)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(page);
        Some(format!("{}{}#{}", self.baseurl, page, name))
    }
}

/// Link every backticked name in `text` that `index` knows.
pub fn add_doc_links(text: &str, index: &dyn SymbolIndex) -> String {
    BACKTICKS
        .replace_all(text, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match index.doc_url(name) {
                Some(url) => format!("[`{}`]({})", name, url),
                None => format!("`{}`", name),
            }
        })
        .into_owned()
}

/// Add documentation links to backticked names in markdown cells.
pub fn treat_backticks(cell: &mut Cell, index: &dyn SymbolIndex) {
    if cell.is_markdown() {
        cell.source = add_doc_links(&cell.source, index);
    }
}

pub struct TreatBackticks {
    index: Arc<dyn SymbolIndex>,
}

impl TreatBackticks {
    pub fn new(index: Arc<dyn SymbolIndex>) -> Self {
        Self { index }
    }
}

impl CellTransform for TreatBackticks {
    fn name(&self) -> &str {
        "treat-backticks"
    }

    fn transform(&self, cell: &mut Cell) -> Result<()> {
        treat_backticks(cell, self.index.as_ref());
        Ok(())
    }
}
