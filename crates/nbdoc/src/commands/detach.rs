/*
 * detach.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Detach command implementation
 */

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use nbdoc_core::nb_detach_cells;

/// Execute the detach command
pub fn execute(path: &Path, dest: Option<&Path>, stdout: bool) -> Result<()> {
    let updated = nb_detach_cells(path, dest, !stdout)
        .with_context(|| format!("Failed to detach attachments of {}", path.display()))?;

    match updated {
        Some(notebook) => {
            let json = notebook.to_json()?;
            std::io::stdout()
                .write_all(json.as_bytes())
                .context("Failed to write notebook to stdout")?;
        }
        None => info!("Updated {}", path.display()),
    }
    Ok(())
}
