use std::path::PathBuf;

/// Errors produced while loading a model or writing/reading a SMAUG text file.
#[derive(Debug, thiserror::Error)]
pub enum SmaugError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid {what} tensor with shape {shape:?}: expected rank >= 2 and a non-empty batch")]
    InvalidSample { what: &'static str, shape: Vec<usize> },

    #[error("shape mismatch: expected {expected} elements for shape {shape:?}, got {got}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },

    #[error("index {index} out of range for axis of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("unsupported dtype: {0}")]
    UnsupportedDType(String),

    #[error("tensor '{0}' not found")]
    MissingTensor(String),

    #[error("invalid model manifest: {0}")]
    Manifest(String),

    #[error("parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SmaugError {
    /// Attach a path to an I/O error.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SmaugError::File {
            path: path.into(),
            source,
        }
    }
}
