/*
 * execute/error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for cell evaluation.
 */

//! Error types for cell evaluation.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while evaluating cells.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The evaluator's runtime (jupyter, a kernel) is not installed.
    #[error("Evaluator runtime not found: {evaluator} requires {runtime}")]
    RuntimeNotFound {
        /// The evaluator that requires the runtime
        evaluator: String,
        /// The runtime that was not found
        runtime: String,
    },

    /// Code execution failed.
    #[error("Execution failed in {evaluator}: {message}")]
    ExecutionFailed {
        /// The evaluator that failed
        evaluator: String,
        /// Error message from the evaluator
        message: String,
    },

    /// A notebook took longer than its execution ceiling.
    #[error("Execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The evaluator returned a different number of cells than requested.
    #[error("Evaluator returned {returned} cells, expected {expected}")]
    CellCountMismatch { expected: usize, returned: usize },

    /// IO error during execution.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ExecutionError {
    /// Create a "runtime not found" error.
    pub fn runtime_not_found(evaluator: impl Into<String>, runtime: impl Into<String>) -> Self {
        Self::RuntimeNotFound {
            evaluator: evaluator.into(),
            runtime: runtime.into(),
        }
    }

    /// Create an "execution failed" error.
    pub fn execution_failed(evaluator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            evaluator: evaluator.into(),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_not_found_error() {
        let err = ExecutionError::runtime_not_found("nbconvert", "jupyter");
        let msg = format!("{}", err);
        assert!(msg.contains("nbconvert"));
        assert!(msg.contains("jupyter"));
    }

    #[test]
    fn test_timeout_error() {
        let err = ExecutionError::Timeout(Duration::from_secs(600));
        assert_eq!(format!("{}", err), "Execution timed out after 600s");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: ExecutionError = io_err.into();
        assert!(matches!(err, ExecutionError::Io(_)));
    }
}
