/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Project settings for documentation builds.
 */

//! Project configuration.
//!
//! Settings live in an `nbdoc.yml` file at the project root. The file is
//! found by walking up from a starting directory. Relative paths in the file
//! are resolved against the directory that contains it.
//!
//! ```yaml
//! lib_name: mylib
//! user: someone
//! nbs_path: nbs
//! doc_path: docs
//! doc_baseurl: /mylib/
//! ```
//!
//! The configuration is an explicit value: every transform and collaborator
//! that needs a setting receives a `&DocConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{NbdocError, Result};

/// Name of the settings file searched for by [`DocConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "nbdoc.yml";

/// Default ceiling for executing one notebook.
pub const DEFAULT_EXECUTE_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocConfig {
    /// Name of the library the notebooks document (used in imports).
    pub lib_name: String,
    pub user: String,
    pub title: String,
    pub description: String,
    pub copyright: String,
    /// Library source directory, relative to the project directory.
    pub lib_path: PathBuf,
    /// Notebook directory, relative to the project directory.
    pub nbs_path: PathBuf,
    /// Documentation site directory, relative to the project directory.
    pub doc_path: PathBuf,
    /// URL prefix prepended to copied image references.
    pub doc_baseurl: String,
    /// Emit Jekyll include directives instead of raw HTML.
    pub jekyll: bool,
    /// Kernel used when executing `show_doc` cells.
    pub kernel_name: String,
    /// Execution ceiling per notebook, in seconds.
    pub execute_timeout: u64,
    /// Optional JSON symbol index (name -> notebook) used to link backticks.
    pub doc_index: Option<PathBuf>,

    /// Directory containing the settings file.
    #[serde(skip)]
    pub project_dir: PathBuf,

    /// Path of the settings file, if one was loaded.
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Every scalar setting as text, for template substitution.
    #[serde(skip)]
    pub values: BTreeMap<String, String>,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            lib_name: "lib".to_string(),
            user: String::new(),
            title: String::new(),
            description: String::new(),
            copyright: String::new(),
            lib_path: PathBuf::from("lib"),
            nbs_path: PathBuf::from("nbs"),
            doc_path: PathBuf::from("docs"),
            doc_baseurl: "/".to_string(),
            jekyll: true,
            kernel_name: "python3".to_string(),
            execute_timeout: DEFAULT_EXECUTE_TIMEOUT_SECS,
            doc_index: None,
            project_dir: PathBuf::from("."),
            config_file: None,
            values: BTreeMap::new(),
        }
    }
}

impl DocConfig {
    /// Default configuration rooted at `project_dir`.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self {
            project_dir: project_dir.into(),
            ..Default::default()
        };
        config.values = config.builtin_values();
        config
    }

    /// Search for `nbdoc.yml` in `start` and its parents and load it.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref().canonicalize()?;
        let mut current = if start.is_file() {
            start
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| NbdocError::other("Start path has no parent directory"))?
        } else {
            start
        };

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => {
                    return Err(NbdocError::other(format!(
                        "Could not find {} in any parent directory",
                        CONFIG_FILE_NAME
                    )));
                }
            }
        }
    }

    /// Load settings from an explicit file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let project_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut config = Self::parse(&content, project_dir).map_err(|e| match e {
            NbdocError::Config { message, .. } => NbdocError::Config {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        config.config_file = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse settings text, resolving relative paths against `project_dir`.
    pub fn parse(content: &str, project_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_error = |message: String| NbdocError::Config {
            path: PathBuf::from(CONFIG_FILE_NAME),
            message,
        };

        let raw: serde_yaml::Value = if content.trim().is_empty() {
            serde_yaml::Value::Mapping(Default::default())
        } else {
            serde_yaml::from_str(content).map_err(|e| config_error(e.to_string()))?
        };

        let mut config: DocConfig =
            serde_yaml::from_value(raw.clone()).map_err(|e| config_error(e.to_string()))?;
        config.project_dir = project_dir.into();

        let mut values = config.builtin_values();
        if let serde_yaml::Value::Mapping(mapping) = &raw {
            for (key, value) in mapping {
                let (Some(key), Some(value)) = (key.as_str(), scalar_to_string(value)) else {
                    continue;
                };
                values.insert(key.to_string(), value);
            }
        }
        config.values = values;
        Ok(config)
    }

    /// Settings always available to templates, even when not written in the file.
    fn builtin_values(&self) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        values.insert("lib_name".into(), self.lib_name.clone());
        values.insert("user".into(), self.user.clone());
        values.insert("title".into(), self.title.clone());
        values.insert("description".into(), self.description.clone());
        values.insert("copyright".into(), self.copyright.clone());
        values.insert("lib_path".into(), self.lib_path.display().to_string());
        values.insert("nbs_path".into(), self.nbs_path.display().to_string());
        values.insert("doc_path".into(), self.doc_path.display().to_string());
        values.insert("doc_baseurl".into(), self.doc_baseurl.clone());
        values
    }

    /// Raw setting value by name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    /// Absolute notebook directory.
    pub fn nbs_dir(&self) -> PathBuf {
        self.resolve(&self.nbs_path)
    }

    /// Absolute documentation directory.
    pub fn doc_dir(&self) -> PathBuf {
        self.resolve(&self.doc_path)
    }

    /// Absolute library directory.
    pub fn lib_dir(&self) -> PathBuf {
        self.resolve(&self.lib_path)
    }

    /// Absolute path of the symbol index, if configured.
    pub fn doc_index_path(&self) -> Option<PathBuf> {
        self.doc_index.as_deref().map(|p| self.resolve(p))
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout)
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
