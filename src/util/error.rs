//! Error types for project persistence.

use std::path::PathBuf;
use thiserror::Error;

use crate::module::ModuleId;

/// Main error type for project save/load operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Canonical save was requested before the project got a file name
    #[error("Project has no file name yet")]
    NoProjectPath,

    /// The primary movie block could not be parsed
    #[error("Invalid movie data: {0}")]
    DatasetParse(String),

    /// A module rejected its own block
    #[error("Failed to load {module} block: {reason}")]
    ModuleLoad { module: ModuleId, reason: String },

    /// Invalid container structure
    #[error("Invalid project structure: {0}")]
    InvalidStructure(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a movie parse error.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::DatasetParse(msg.into())
    }

    /// Map an `open()` failure, keeping "not found" distinguishable.
    pub fn from_open(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path.into())
        } else {
            Self::Io(err)
        }
    }
}

/// Result type alias for project operations.
pub type Result<T> = std::result::Result<T, Error>;
