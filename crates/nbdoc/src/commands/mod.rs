//! Command implementations for the nbdoc CLI
//!
//! Each command module handles the CLI interface and delegates to
//! nbdoc-core for actual implementation.

use std::path::Path;

use anyhow::{Context, Result};
use nbdoc_core::DocConfig;

pub mod build_docs;
pub mod convert_md;
pub mod detach;
pub mod init_templates;

/// Load the settings named by `--config`, or the nearest `nbdoc.yml` above
/// the working directory.
pub fn load_config(explicit: Option<&Path>) -> Result<DocConfig> {
    match explicit {
        Some(path) => DocConfig::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            DocConfig::discover(&cwd).context("Not inside an nbdoc project")
        }
    }
}
