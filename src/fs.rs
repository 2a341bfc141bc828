//! Filesystem access used by discovery and the log reader.
//!
//! Everything above this module talks to storage through [`FileSystem`], so a
//! different backend (object store, in-memory fixture) only has to provide a
//! directory listing and whole-file reads.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::FsError;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name of the entry (no parent components).
    pub name: String,
    /// Whether the entry is (or, for symlinks, points at) a directory.
    pub is_directory: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }
}

/// Read-only storage interface.
///
/// Implementations must be shareable across worker threads; the history
/// collector reads several tables concurrently through one instance.
pub trait FileSystem: Send + Sync {
    /// List the entries of `dir`.
    ///
    /// Returns [`FsError::NotFound`] when `dir` does not exist.
    fn list_entries(&self, dir: &Path) -> Result<Vec<DirEntry>, FsError>;

    /// Read the full contents of the file at `path`.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Resolve `path` to the identity used for cycle detection.
    ///
    /// Backends without links can return the path unchanged.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
        Ok(path.to_path_buf())
    }
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn map_io(path: &Path, source: io::Error) -> FsError {
    if source.kind() == io::ErrorKind::NotFound {
        FsError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        FsError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn list_entries(&self, dir: &Path) -> Result<Vec<DirEntry>, FsError> {
        let read_dir = fs::read_dir(dir).map_err(|e| map_io(dir, e))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| map_io(dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();

            // fs::metadata follows symlinks; a dangling link is listed as a file
            let is_directory = match fs::metadata(entry.path()) {
                Ok(metadata) => metadata.is_dir(),
                Err(_) => false,
            };

            entries.push(DirEntry { name, is_directory });
        }

        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        fs::read(path).map_err(|e| map_io(path, e))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
        fs::canonicalize(path).map_err(|e| map_io(path, e))
    }
}
