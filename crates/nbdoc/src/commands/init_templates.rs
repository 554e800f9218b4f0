/*
 * init_templates.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Init-templates command implementation
 */

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use nbdoc_core::write_tmpls;

/// Execute the init-templates command
pub fn execute(config: Option<&Path>) -> Result<()> {
    let config = super::load_config(config)?;
    let written = write_tmpls(&config).context("Failed to write site templates")?;
    if written.is_empty() {
        info!("All site files already exist");
    }
    for path in &written {
        info!("Created {}", path.display());
    }
    Ok(())
}
