use crate::codec::Operation;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during dataset, databook and codec operations
#[derive(Error, Debug)]
pub enum TabError {
    #[error("Row length mismatch: expected {expected} values, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("Rows must hold at least one value")]
    EmptyRow,

    #[error("Dataset has headers; a header is required for the new column")]
    HeadersRequired,

    #[error("Row index out of bounds: {index} (dataset has {count} rows)")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("Column index out of bounds: {index} (dataset has {count} columns)")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Format not registered: {format}")]
    UnsupportedFormat { format: String },

    #[error("Ragged {format} input: row {row} has {actual} values, expected at most {expected}")]
    RaggedInput {
        format: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Unable to detect the format of the input")]
    UndetectableFormat,

    #[error("Format {format} does not support {operation}")]
    Capability { format: String, operation: Operation },

    #[error("{format} import failed: {message}")]
    Import {
        format: &'static str,
        message: String,
    },

    #[error("{format} export failed: {message}")]
    Export {
        format: &'static str,
        message: String,
    },

    #[error("Invalid option '{key}': expected {expected}")]
    InvalidOption { key: String, expected: &'static str },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`TabError`], stable across codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Shape,
    Index,
    Key,
    UnsupportedFormat,
    UndetectableFormat,
    Import,
    Export,
    Capability,
    Config,
    Io,
}

impl TabError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TabError::Shape { .. } | TabError::EmptyRow | TabError::HeadersRequired => {
                ErrorKind::Shape
            }
            TabError::RowIndexOutOfBounds { .. } | TabError::ColumnIndexOutOfBounds { .. } => {
                ErrorKind::Index
            }
            TabError::ColumnNotFound { .. } | TabError::SheetNotFound { .. } => ErrorKind::Key,
            TabError::UnsupportedFormat { .. } | TabError::RaggedInput { .. } => {
                ErrorKind::UnsupportedFormat
            }
            TabError::UndetectableFormat => ErrorKind::UndetectableFormat,
            TabError::Import { .. } => ErrorKind::Import,
            TabError::Export { .. } => ErrorKind::Export,
            TabError::Capability { .. } => ErrorKind::Capability,
            TabError::InvalidOption { .. } | TabError::InvalidOptions(_) => ErrorKind::Config,
            TabError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn import(format: &'static str, err: impl fmt::Display) -> Self {
        TabError::Import {
            format,
            message: err.to_string(),
        }
    }

    pub(crate) fn export(format: &'static str, err: impl fmt::Display) -> Self {
        TabError::Export {
            format,
            message: err.to_string(),
        }
    }

    pub(crate) fn capability(format: &str, operation: Operation) -> Self {
        TabError::Capability {
            format: format.to_string(),
            operation,
        }
    }
}

pub type Result<T> = std::result::Result<T, TabError>;
