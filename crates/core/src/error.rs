//! Error types for flowalloc

use thiserror::Error;

/// Main error type for flowalloc operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input grid not found: {name}")]
    MissingInput { name: String },

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in grid of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Input grids must have the same dimensions: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Out of memory allocating a grid buffer of {cells} cells")]
    OutOfMemory { cells: usize },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`], used by hosts to report each class
/// of failure differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing/nonexistent inputs, mismatched dimensions, bad parameters.
    /// Detected before any pass runs.
    Precondition,
    /// A grid buffer could not be allocated.
    ResourceExhaustion,
    /// User-requested early exit. Not a failure.
    Cancelled,
    /// Anything else: I/O failure mid-run, codec failures, internal errors.
    Runtime,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingInput { .. }
            | Error::InvalidDimensions { .. }
            | Error::SizeMismatch { .. }
            | Error::InvalidParameter { .. } => ErrorKind::Precondition,
            Error::OutOfMemory { .. } => ErrorKind::ResourceExhaustion,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Io(_)
            | Error::IndexOutOfBounds { .. }
            | Error::UnsupportedDataType(_)
            | Error::Algorithm(_)
            | Error::Other(_) => ErrorKind::Runtime,
        }
    }

    /// Whether this error is a cooperative cancellation rather than a failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias for flowalloc operations
pub type Result<T> = std::result::Result<T, Error>;
