/*
 * notebook.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * In-memory model of the notebook JSON format.
 */

//! Notebook document model.
//!
//! Notebooks are JSON objects with a `cells` array. Cell sources appear on
//! disk either as a single string or as a list of lines; they are always
//! normalized to one string in memory and written back as a list of lines.
//!
//! Keys the pipeline does not know about are kept in `extra` maps so a
//! document can be written back without losing information.

use std::fs;
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{NbdocError, Result};

/// MIME type of interactive widget views in cell outputs.
pub const WIDGET_VIEW_MIME: &str = "application/vnd.jupyter.widget-view+json";

/// Kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
    Markdown,
    Raw,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Code => "code",
            CellType::Markdown => "markdown",
            CellType::Raw => "raw",
        }
    }
}

/// One notebook cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,

    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: String,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Output records, kept opaque. Only meaningful for code cells.
    #[serde(default)]
    pub outputs: Vec<Value>,

    #[serde(default)]
    pub execution_count: Option<u64>,

    /// Inline attachments (name -> mime -> base64 payload).
    #[serde(default)]
    pub attachments: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    /// Create a code cell with no outputs.
    pub fn code(source: impl Into<String>) -> Self {
        Self::new(CellType::Code, source)
    }

    /// Create a markdown cell.
    pub fn markdown(source: impl Into<String>) -> Self {
        Self::new(CellType::Markdown, source)
    }

    fn new(cell_type: CellType, source: impl Into<String>) -> Self {
        Self {
            cell_type,
            source: source.into(),
            metadata: Map::new(),
            outputs: Vec::new(),
            execution_count: None,
            attachments: None,
            extra: Map::new(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    pub fn is_markdown(&self) -> bool {
        self.cell_type == CellType::Markdown
    }

    /// Whether the cell input should be left out of rendered output.
    pub fn hides_input(&self) -> bool {
        self.metadata
            .get("hide_input")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("cell_type", &self.cell_type)?;
        if self.is_code() {
            map.serialize_entry("execution_count", &self.execution_count)?;
        }
        map.serialize_entry("metadata", &self.metadata)?;
        if self.is_code() {
            map.serialize_entry("outputs", &self.outputs)?;
        }
        map.serialize_entry("source", &split_source_lines(&self.source))?;
        if let Some(attachments) = &self.attachments {
            map.serialize_entry("attachments", attachments)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A notebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(default = "default_nbformat")]
    pub nbformat: u32,

    #[serde(default = "default_nbformat_minor")]
    pub nbformat_minor: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_nbformat() -> u32 {
    4
}

fn default_nbformat_minor() -> u32 {
    2
}

impl Notebook {
    /// Create a notebook from a list of cells with empty metadata.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: Map::new(),
            nbformat: default_nbformat(),
            nbformat_minor: default_nbformat_minor(),
            extra: Map::new(),
        }
    }

    /// Parse a notebook from JSON text. `origin` only labels errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| NbdocError::Notebook {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read a notebook from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Serialize the notebook the way notebook editors write it.
    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)
            .map_err(|e| NbdocError::other(format!("Failed to serialize notebook: {}", e)))?;
        text.push('\n');
        Ok(text)
    }

    /// Write the notebook to disk.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Kernel name recorded in the notebook metadata, if any.
    pub fn kernel_name(&self) -> Option<&str> {
        self.metadata
            .get("kernelspec")
            .and_then(|k| k.get("name"))
            .and_then(Value::as_str)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceRepr {
    Text(String),
    Lines(Vec<String>),
}

fn deserialize_source<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(match SourceRepr::deserialize(deserializer)? {
        SourceRepr::Text(text) => text,
        SourceRepr::Lines(lines) => lines.concat(),
    })
}

/// Split a source string into lines that keep their trailing newline.
pub fn split_source_lines(source: &str) -> Vec<&str> {
    source.split_inclusive('\n').collect()
}
