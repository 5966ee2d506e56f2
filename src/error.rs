// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vector store connection error: {0}")]
    Connection(String),

    #[error("Fetch failed for {locator}: {message}")]
    Fetch { locator: String, message: String },

    #[error("Parse failed for {locator}: {message}")]
    Parse { locator: String, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Store write failed after {written} document(s): {message}")]
    StoreWrite { written: usize, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Fatal errors abort the run; everything else is captured per locator
    /// and reported in the final summary.
    pub fn is_fatal(&self) -> bool {
        matches!(self, IngestError::Config(_) | IngestError::Connection(_))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            IngestError::Config(_) => FailureKind::Config,
            IngestError::Connection(_) => FailureKind::Connection,
            IngestError::Fetch { .. } => FailureKind::Fetch,
            IngestError::Parse { .. } => FailureKind::Parse,
            IngestError::Embedding(_) => FailureKind::Embedding,
            IngestError::StoreWrite { .. } => FailureKind::StoreWrite,
            IngestError::Validation(_) => FailureKind::Validation,
            IngestError::Io(_) => FailureKind::Io,
        }
    }
}

/// Coarse failure classification used when aggregating per-locator errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureKind {
    Config,
    Connection,
    Fetch,
    Parse,
    Embedding,
    StoreWrite,
    Validation,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Config => "config",
            FailureKind::Connection => "connection",
            FailureKind::Fetch => "fetch",
            FailureKind::Parse => "parse",
            FailureKind::Embedding => "embedding",
            FailureKind::StoreWrite => "store_write",
            FailureKind::Validation => "validation",
            FailureKind::Io => "io",
        };
        write!(f, "{}", name)
    }
}
