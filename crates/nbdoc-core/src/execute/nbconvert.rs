/*
 * execute/nbconvert.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Cell evaluation through a jupyter nbconvert subprocess.
 */

//! Cell evaluation through `jupyter nbconvert`.
//!
//! The selected cells are copied into a scratch notebook that keeps the
//! original notebook metadata. That notebook is written to the stdin of
//!
//! ```text
//! jupyter nbconvert --to notebook --execute --stdin --stdout \
//!     --ExecutePreprocessor.timeout=600 --ExecutePreprocessor.kernel_name=python3
//! ```
//!
//! and the executed notebook is read back from stdout. Its cells map back to
//! the requested indices by position.
//!
//! The whole subprocess runs against a deadline of the document timeout;
//! a child still running when it passes is killed and reported as
//! [`ExecutionError::Timeout`].
//!
//! # Finding jupyter
//!
//! [`find_jupyter`] checks the `NBDOC_JUPYTER` environment variable first
//! (path to the `jupyter` binary), then searches `PATH` via `which`.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{CellEvaluator, EvaluatedCell, ExecutionError};
use crate::notebook::Notebook;

const EVALUATOR_NAME: &str = "nbconvert";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Locate the `jupyter` binary.
pub fn find_jupyter() -> Option<PathBuf> {
    if let Ok(jupyter) = std::env::var("NBDOC_JUPYTER") {
        let path = PathBuf::from(jupyter);
        if path.is_file() {
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "NBDOC_JUPYTER does not point to a file; searching PATH");
    }
    which::which("jupyter").ok()
}

/// Evaluator backed by `jupyter nbconvert --execute`.
#[derive(Debug, Clone)]
pub struct NbconvertEvaluator {
    jupyter: Option<PathBuf>,
    kernel_name: String,
    working_dir: Option<PathBuf>,
}

impl NbconvertEvaluator {
    pub fn new(kernel_name: impl Into<String>) -> Self {
        Self {
            jupyter: find_jupyter(),
            kernel_name: kernel_name.into(),
            working_dir: None,
        }
    }

    /// Use an explicit `jupyter` binary instead of searching for one.
    pub fn with_jupyter(mut self, jupyter: impl Into<PathBuf>) -> Self {
        self.jupyter = Some(jupyter.into());
        self
    }

    /// Directory the kernel starts in.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn jupyter_path(&self) -> Option<&Path> {
        self.jupyter.as_deref()
    }

    fn command(&self, jupyter: &Path, timeout: Duration) -> Command {
        let mut cmd = Command::new(jupyter);
        cmd.args([
            "nbconvert",
            "--to",
            "notebook",
            "--execute",
            "--stdin",
            "--stdout",
            "--log-level=ERROR",
        ])
        .arg(format!("--ExecutePreprocessor.timeout={}", timeout.as_secs()))
        .arg(format!("--ExecutePreprocessor.kernel_name={}", self.kernel_name))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Notebook holding only the cells at `indices`, with outputs cleared.
fn scratch_notebook(notebook: &Notebook, indices: &[usize]) -> Notebook {
    let cells = indices
        .iter()
        .map(|&i| {
            let mut cell = notebook.cells[i].clone();
            cell.outputs.clear();
            cell.execution_count = None;
            cell
        })
        .collect();
    Notebook {
        cells,
        metadata: notebook.metadata.clone(),
        nbformat: notebook.nbformat,
        nbformat_minor: notebook.nbformat_minor,
        extra: notebook.extra.clone(),
    }
}

impl CellEvaluator for NbconvertEvaluator {
    fn name(&self) -> &str {
        EVALUATOR_NAME
    }

    fn evaluate(
        &self,
        notebook: &Notebook,
        indices: &[usize],
        timeout: Duration,
    ) -> Result<Vec<EvaluatedCell>, ExecutionError> {
        let jupyter = self.jupyter.as_deref().ok_or_else(|| {
            ExecutionError::runtime_not_found(EVALUATOR_NAME, "jupyter (pip install nbconvert)")
        })?;

        let input = scratch_notebook(notebook, indices)
            .to_json()
            .map_err(|e| ExecutionError::other(format!("Failed to serialize notebook: {}", e)))?;

        let mut child = self.command(jupyter, timeout).spawn().map_err(|e| {
            ExecutionError::other(format!(
                "Failed to spawn jupyter ({}): {}",
                jupyter.display(),
                e
            ))
        })?;

        let stdin = child.stdin.take().map(|mut pipe| {
            thread::spawn(move || {
                // A child that exits early closes the pipe; its exit status
                // reports the failure.
                let _ = pipe.write_all(input.as_bytes());
            })
        });
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match wait_with_deadline(&mut child, timeout)? {
            Some(status) => status,
            None => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "jupyter nbconvert exceeded its deadline; killing it"
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecutionError::Timeout(timeout));
            }
        };

        if let Some(handle) = stdin {
            let _ = handle.join();
        }
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            if stderr.contains("TimeoutError") {
                return Err(ExecutionError::Timeout(timeout));
            }
            return Err(ExecutionError::execution_failed(
                EVALUATOR_NAME,
                last_lines(&stderr, 20),
            ));
        }

        let stdout = String::from_utf8_lossy(&stdout);
        let executed = Notebook::parse(&stdout, Path::new("<nbconvert stdout>")).map_err(|e| {
            ExecutionError::other(format!("Failed to parse executed notebook: {}", e))
        })?;

        Ok(executed
            .cells
            .into_iter()
            .map(|cell| EvaluatedCell {
                outputs: cell.outputs,
                execution_count: cell.execution_count,
            })
            .collect())
    }
}

/// Poll `child` until it exits or `timeout` elapses. `None` means the
/// deadline passed with the child still running.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<ExitStatus>, ExecutionError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Read a pipe to the end on its own thread so the child never blocks on a
/// full pipe.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// The tail of a long stderr, which is where the traceback ends.
fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::Cell;
    use serde_json::json;

    #[test]
    fn test_scratch_notebook_keeps_selected_cells() {
        let mut notebook = Notebook::from_cells(vec![
            Cell::code("a"),
            Cell::code("show_doc(f)"),
            Cell::code("b"),
        ]);
        notebook.cells[1].outputs = vec![json!({"output_type": "stream"})];
        notebook.metadata.insert("kernelspec".into(), json!({"name": "python3"}));

        let scratch = scratch_notebook(&notebook, &[1]);
        assert_eq!(scratch.cells.len(), 1);
        assert_eq!(scratch.cells[0].source, "show_doc(f)");
        assert!(scratch.cells[0].outputs.is_empty());
        assert_eq!(scratch.kernel_name(), Some("python3"));
    }

    #[test]
    fn test_missing_jupyter_is_runtime_error() {
        let evaluator = NbconvertEvaluator {
            jupyter: None,
            kernel_name: "python3".to_string(),
            working_dir: None,
        };
        let notebook = Notebook::from_cells(vec![Cell::code("show_doc(f)")]);
        let err = evaluator
            .evaluate(&notebook, &[0], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::RuntimeNotFound { .. }));
    }

    #[test]
    fn test_command_line() {
        let evaluator = NbconvertEvaluator::new("python3").with_working_dir("/tmp");
        let cmd = evaluator.command(Path::new("/usr/bin/jupyter"), Duration::from_secs(600));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"--execute".to_string()));
        assert!(args.contains(&"--ExecutePreprocessor.timeout=600".to_string()));
        assert!(args.contains(&"--ExecutePreprocessor.kernel_name=python3".to_string()));
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/tmp")));
    }

    #[cfg(unix)]
    #[test]
    fn test_stalled_jupyter_is_killed_at_deadline() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let script = temp.path().join("jupyter");
        std::fs::write(&script, "#!/bin/sh\ncat >/dev/null\nsleep 4\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let evaluator = NbconvertEvaluator::new("python3").with_jupyter(&script);
        let notebook = Notebook::from_cells(vec![Cell::code("show_doc(f)")]);
        let started = Instant::now();
        let err = evaluator
            .evaluate(&notebook, &[0], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Timeout(t) if t == Duration::from_secs(1)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_jupyter_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let script = temp.path().join("jupyter");
        std::fs::write(&script, "#!/bin/sh\ncat >/dev/null\necho 'NameError: f' >&2\nexit 1\n")
            .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let evaluator = NbconvertEvaluator::new("python3").with_jupyter(&script);
        let notebook = Notebook::from_cells(vec![Cell::code("show_doc(f)")]);
        let err = evaluator
            .evaluate(&notebook, &[0], Duration::from_secs(10))
            .unwrap_err();
        match err {
            ExecutionError::ExecutionFailed { message, .. } => {
                assert!(message.contains("NameError: f"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_last_lines() {
        assert_eq!(last_lines("a\nb\nc", 2), "b\nc");
        assert_eq!(last_lines("a", 5), "a");
    }
}
