/*
 * build_docs.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Build-docs command implementation
 */

//! Build-docs command implementation.
//!
//! Converts the notebooks of the project to HTML pages in the documentation
//! directory. Only notebooks newer than their page are converted unless
//! `--force-all` is given. A failing notebook does not stop the others, but
//! makes the command exit with an error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use nbdoc_core::{BatchOptions, ConvertContext, NoopEvaluator, notebook2html};

/// Arguments for the build-docs command
#[derive(Debug)]
pub struct BuildDocsArgs<'a> {
    pub config: Option<&'a Path>,
    pub fname: Option<String>,
    pub force_all: bool,
    pub n_workers: Option<usize>,
    pub max_jitter: f64,
    pub dest: Option<PathBuf>,
    pub no_execute: bool,
}

/// Execute the build-docs command
pub fn execute(args: BuildDocsArgs) -> Result<()> {
    let config = super::load_config(args.config)?;

    let mut ctx = ConvertContext::new(config).context("Failed to set up conversion")?;
    if args.no_execute {
        ctx = ctx.with_evaluator(Arc::new(NoopEvaluator));
    }
    if let Some(dest) = args.dest {
        ctx = ctx.with_dest(dest);
    }

    let max_jitter = Duration::try_from_secs_f64(args.max_jitter)
        .with_context(|| format!("Invalid --max-jitter value: {}", args.max_jitter))?;
    let options = BatchOptions {
        pattern: args.fname,
        force_all: args.force_all,
        n_workers: args.n_workers,
        max_jitter,
        cancel: None,
    };

    let report = notebook2html(&ctx, &options)?;
    for (input, err) in report.failures() {
        error!("{}: {}", input.display(), err);
    }

    let failed = report.failed();
    if failed > 0 {
        anyhow::bail!(
            "{} of {} notebooks failed to convert",
            failed,
            report.documents.len()
        );
    }
    info!(
        "Converted {} notebooks into {}",
        report.succeeded(),
        ctx.dest_dir().display()
    );
    Ok(())
}
