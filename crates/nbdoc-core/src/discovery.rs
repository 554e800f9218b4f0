/*
 * discovery.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Finding the notebooks to convert.
 */

//! Notebook discovery.
//!
//! Without a pattern, every top-level `*.ipynb` in the notebook directory is
//! a candidate, except names starting with `_`. With a pattern, the glob's
//! matches are used as given. In incremental mode a candidate is kept only
//! when its page is missing or not newer than the notebook.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::Result;
use crate::convert::nb2html_fname;

/// Notebooks selected for a build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    /// Set when exactly one notebook matched: it is rebuilt unconditionally
    /// and processed without a worker pool.
    pub single_file: bool,
}

/// Top-level notebooks of `nbs_dir`, sorted by name.
pub fn notebooks_in(nbs_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(nbs_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "ipynb"))
        .filter(|e| !e.file_name().to_string_lossy().starts_with('_'))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Paths matching a glob pattern, in glob order.
pub fn notebooks_matching(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => tracing::warn!(error = %e, "Skipping unreadable glob match"),
        }
    }
    if files.is_empty() {
        tracing::warn!(pattern, "No files matched pattern");
    }
    Ok(files)
}

/// Whether the page for `notebook` in `dest` must be rebuilt: it is
/// missing, or the notebook was modified at or after the page.
pub fn needs_rebuild(notebook: &Path, dest: &Path) -> bool {
    let output = match std::path::absolute(notebook) {
        Ok(abs) => nb2html_fname(&abs, dest),
        Err(_) => return true,
    };
    let modified = |p: &Path| std::fs::metadata(p).and_then(|m| m.modified());
    match (modified(notebook), modified(&output)) {
        (Ok(input), Ok(output)) => input >= output,
        _ => true,
    }
}

/// Select the notebooks to convert.
///
/// `pattern` replaces the default listing of `nbs_dir`. Unless `force_all`
/// is set, notebooks whose page in `dest` is up to date are skipped. A single
/// match is always rebuilt.
pub fn discover(
    nbs_dir: &Path,
    pattern: Option<&str>,
    dest: &Path,
    force_all: bool,
) -> Result<Discovery> {
    let candidates = match pattern {
        Some(pattern) => notebooks_matching(pattern)?,
        None => notebooks_in(nbs_dir),
    };
    let single_file = candidates.len() == 1;
    let files = if force_all || single_file {
        candidates
    } else {
        let total = candidates.len();
        let files: Vec<PathBuf> = candidates
            .into_iter()
            .filter(|f| needs_rebuild(f, dest))
            .collect();
        tracing::debug!(total, modified = files.len(), "Filtered unmodified notebooks");
        files
    };
    Ok(Discovery { files, single_file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, time: SystemTime) {
        fs::write(path, "{\"cells\": []}").unwrap();
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    #[test]
    fn test_default_listing() {
        let temp = TempDir::new().unwrap();
        let nbs = temp.path();
        for name in ["01_b.ipynb", "00_a.ipynb", "_draft.ipynb", "notes.md"] {
            fs::write(nbs.join(name), "{}").unwrap();
        }
        fs::create_dir(nbs.join("sub")).unwrap();
        fs::write(nbs.join("sub").join("02_c.ipynb"), "{}").unwrap();

        let names: Vec<String> = notebooks_in(nbs)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["00_a.ipynb", "01_b.ipynb"]);
    }

    #[test]
    fn test_glob_pattern() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("00_a.ipynb"), "{}").unwrap();
        fs::write(temp.path().join("01_b.ipynb"), "{}").unwrap();
        let pattern = format!("{}/00_*.ipynb", temp.path().display());
        let files = notebooks_matching(&pattern).unwrap();
        assert_eq!(files, vec![temp.path().join("00_a.ipynb")]);
    }

    #[test]
    fn test_incremental_skips_up_to_date_pages() {
        let temp = TempDir::new().unwrap();
        let nbs = temp.path().join("nbs");
        let docs = temp.path().join("docs");
        fs::create_dir_all(&nbs).unwrap();
        fs::create_dir_all(&docs).unwrap();

        let old = SystemTime::now() - Duration::from_secs(3600);
        let new = SystemTime::now();
        touch(&nbs.join("00_fresh.ipynb"), old);
        touch(&docs.join("fresh.html"), new);
        touch(&nbs.join("01_stale.ipynb"), new);
        touch(&docs.join("stale.html"), old);
        touch(&nbs.join("02_missing.ipynb"), old);

        let found = discover(&nbs, None, &docs, false).unwrap();
        assert!(!found.single_file);
        assert_eq!(
            found.files,
            vec![nbs.join("01_stale.ipynb"), nbs.join("02_missing.ipynb")]
        );

        let all = discover(&nbs, None, &docs, true).unwrap();
        assert_eq!(all.files.len(), 3);
    }

    #[test]
    fn test_single_file_forces_rebuild() {
        let temp = TempDir::new().unwrap();
        let nbs = temp.path().join("nbs");
        let docs = temp.path().join("docs");
        fs::create_dir_all(&nbs).unwrap();
        fs::create_dir_all(&docs).unwrap();
        touch(&nbs.join("00_core.ipynb"), SystemTime::now() - Duration::from_secs(3600));
        touch(&docs.join("core.html"), SystemTime::now());

        let pattern = format!("{}/*.ipynb", nbs.display());
        let found = discover(&nbs, Some(&pattern), &docs, false).unwrap();
        assert!(found.single_file);
        assert_eq!(found.files, vec![nbs.join("00_core.ipynb")]);
    }
}
