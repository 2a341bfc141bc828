use std::io;
use std::path::PathBuf;

/// Failure reported by a [`FileSystem`](crate::fs::FileSystem) backend.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("path not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }
}

/// Errors produced while discovering tables and rebuilding their history.
///
/// Only [`HistoryError::InvalidArgument`], [`HistoryError::WorkerPool`] and
/// [`HistoryError::Cancelled`] abort a whole call; the other variants are
/// confined to a single table and surface as diagnostics next to the result.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: FsError,
    },

    #[error("corrupt commit {version} ({}), line {line}: {reason}", path.display())]
    CorruptCommit {
        version: u64,
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("log versions out of order: version {version} follows {previous}")]
    InternalConsistency { previous: u64, version: u64 },

    #[error("row or byte totals overflow at version {version}")]
    Overflow { version: u64 },

    #[error("failed to read checkpoint {version}: {reason}")]
    Checkpoint { version: u64, reason: String },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, HistoryError>;
