//! Error types for nbdoc-core

use std::path::PathBuf;
use thiserror::Error;

use crate::execute::ExecutionError;

#[derive(Error, Debug)]
pub enum NbdocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid notebook {path}: {source}")]
    Notebook {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Image not found: {}", .0.display())]
    MissingImage(PathBuf),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("{0}")]
    Other(String),
}

impl NbdocError {
    /// Create an error from any message.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a render error.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, NbdocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_message() {
        let err = NbdocError::MissingImage(PathBuf::from("/nbs/images/a.png"));
        let msg = format!("{}", err);
        assert!(msg.contains("Image not found"));
        assert!(msg.contains("a.png"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NbdocError = io_err.into();
        assert!(matches!(err, NbdocError::Io(_)));
    }

    #[test]
    fn test_execution_error_is_transparent() {
        let err: NbdocError = ExecutionError::execution_failed("nbconvert", "kernel died").into();
        let msg = format!("{}", err);
        assert!(msg.contains("kernel died"));
    }
}
