/*
 * convert_md.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Convert-md command implementation
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use nbdoc_core::{DocConfig, MarkdownOptions, convert_md};

/// Arguments for the convert-md command
#[derive(Debug)]
pub struct ConvertMdArgs<'a> {
    pub config: Option<&'a Path>,
    pub fname: PathBuf,
    pub dest: PathBuf,
    pub img_path: Option<String>,
    pub jekyll: bool,
}

/// Execute the convert-md command
pub fn execute(args: ConvertMdArgs) -> Result<()> {
    if !args.fname.is_file() {
        anyhow::bail!("Notebook does not exist: {}", args.fname.display());
    }

    // A Markdown page can be built outside a project; settings only affect
    // the recorded notebook path.
    let config = match super::load_config(args.config) {
        Ok(config) => config,
        Err(e) if args.config.is_none() => {
            warn!("{:#}; using default settings", e);
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            DocConfig::new(cwd)
        }
        Err(e) => return Err(e),
    };

    let mut options = MarkdownOptions::new(&args.dest);
    options.jekyll = args.jekyll;
    if let Some(img_path) = args.img_path {
        options.img_path = img_path;
    }

    let page = convert_md(&args.fname, &options, &config)
        .with_context(|| format!("Failed to convert {}", args.fname.display()))?;
    info!("Wrote {}", page.display());
    Ok(())
}
