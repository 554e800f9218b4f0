/*
 * batch.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Converting many notebooks, optionally in parallel.
 */

//! Batch conversion.
//!
//! Each notebook is converted completely by one worker; nothing mutable is
//! shared between documents. A failing notebook is logged and counted and
//! the rest of the batch continues. Cancellation is checked between
//! documents.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use rayon::prelude::*;

use crate::Result;
use crate::convert::{ConvertContext, convert_one};
use crate::discovery::discover;
use crate::error::NbdocError;

/// Default upper bound of the random delay before each parallel conversion.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Glob selecting notebooks; all notebooks of the notebook directory when
    /// unset.
    pub pattern: Option<String>,
    /// Rebuild pages that are already up to date.
    pub force_all: bool,
    /// Worker threads. `None` uses one per CPU; `0` or `1` runs sequentially.
    pub n_workers: Option<usize>,
    /// Random delay bound before each parallel conversion. Zero disables it.
    pub max_jitter: Duration,
    /// Stops the batch before the next document when set.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            pattern: None,
            force_all: false,
            n_workers: None,
            max_jitter: DEFAULT_MAX_JITTER,
            cancel: None,
        }
    }
}

/// Outcome of one document.
#[derive(Debug)]
pub struct DocumentResult {
    pub input: PathBuf,
    pub result: Result<PathBuf>,
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<DocumentResult>,
    /// Documents not started because the batch was cancelled.
    pub cancelled: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.documents.iter().filter(|d| d.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.documents.iter().filter(|d| d.result.is_err()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &NbdocError)> {
        self.documents
            .iter()
            .filter_map(|d| d.result.as_ref().err().map(|e| (&d.input, e)))
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.cancelled == 0
    }
}

fn is_cancelled(options: &BatchOptions) -> bool {
    options
        .cancel
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::SeqCst))
}

fn jitter(max: Duration) {
    if max.is_zero() {
        return;
    }
    let delay = rand::rng().random_range(0.0..max.as_secs_f64());
    std::thread::sleep(Duration::from_secs_f64(delay));
}

/// Convert every file in `files`, in parallel when `n_workers` allows.
pub fn convert_all(files: &[PathBuf], ctx: &ConvertContext, options: &BatchOptions) -> Result<BatchReport> {
    let run = |file: &PathBuf, parallel: bool| -> Option<DocumentResult> {
        if is_cancelled(options) {
            return None;
        }
        if parallel {
            jitter(options.max_jitter);
        }
        Some(DocumentResult {
            input: file.clone(),
            result: convert_one(file, ctx),
        })
    };

    let sequential = matches!(options.n_workers, Some(0 | 1));
    let results: Vec<Option<DocumentResult>> = if sequential {
        files.iter().map(|f| run(f, false)).collect()
    } else {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = options.n_workers {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| NbdocError::other(format!("Failed to start worker pool: {}", e)))?;
        pool.install(|| files.par_iter().map(|f| run(f, true)).collect())
    };

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Some(doc) => report.documents.push(doc),
            None => report.cancelled += 1,
        }
    }
    Ok(report)
}

/// Convert the selected notebooks of the project to HTML pages.
pub fn notebook2html(ctx: &ConvertContext, options: &BatchOptions) -> Result<BatchReport> {
    let found = discover(
        &ctx.config.nbs_dir(),
        options.pattern.as_deref(),
        &ctx.dest_dir(),
        options.force_all,
    )?;

    if found.files.is_empty() {
        tracing::info!("No notebooks were modified");
        return Ok(BatchReport::default());
    }

    let mut options = options.clone();
    if found.single_file && options.n_workers.is_none() {
        options.n_workers = Some(0);
    }
    tracing::info!(
        notebooks = found.files.len(),
        workers = ?options.n_workers,
        "Converting notebooks"
    );

    let report = convert_all(&found.files, ctx, &options)?;
    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        cancelled = report.cancelled,
        "Batch finished"
    );
    Ok(report)
}
