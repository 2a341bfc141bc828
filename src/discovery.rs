//! Table discovery.
//!
//! A directory is a table root when it has a `_delta_log` subdirectory holding
//! at least one commit file. The directory passed in by the caller is held to
//! a weaker test: an existing `_delta_log` is enough, so a table that has been
//! created but never written still shows up with an empty history.
//!
//! Recursive discovery walks depth-first with an explicit stack. It does not
//! look for tables inside a table and visits each physical directory once,
//! keyed on its canonical path, so symlink loops terminate.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::delta::naming::{is_commit_file, LOG_DIR_NAME};
use crate::filter::DiscoveryFilter;
use crate::fs::{DirEntry, FileSystem};
use crate::report::Diagnostic;

/// Lazy iterator over the table roots under a path.
pub struct Discovery<'a> {
    fs: &'a dyn FileSystem,
    root: PathBuf,
    recursive: bool,
    filter: Option<&'a DiscoveryFilter>,
    stack: Vec<PathBuf>,
    visited: HashSet<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

/// Start discovering tables under `root`.
///
/// A `root` that is itself a `_delta_log` directory designates its parent
/// table.
pub fn discover<'a>(fs: &'a dyn FileSystem, root: impl AsRef<Path>, recursive: bool) -> Discovery<'a> {
    let root = table_root_of(root.as_ref());
    Discovery {
        fs,
        stack: vec![root.clone()],
        root,
        recursive,
        filter: None,
        visited: HashSet::new(),
        diagnostics: Vec::new(),
    }
}

/// Map a path naming a log directory to the table that owns it.
pub fn table_root_of(path: &Path) -> PathBuf {
    if path.file_name().is_some_and(|name| name == LOG_DIR_NAME) {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                return parent.to_path_buf();
            }
            return PathBuf::from(".");
        }
    }
    path.to_path_buf()
}

impl<'a> Discovery<'a> {
    pub fn with_filter(mut self, filter: &'a DiscoveryFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Problems met so far. Unreadable directories are skipped, not fatal.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Drain the iterator into a sorted, de-duplicated table list.
    pub fn collect_sorted(mut self) -> (Vec<PathBuf>, Vec<Diagnostic>) {
        let mut tables: Vec<PathBuf> = self.by_ref().collect();
        tables.sort();
        tables.dedup();
        (tables, self.diagnostics)
    }

    fn unreadable(&mut self, dir: &Path, reason: String) {
        log::warn!("Skipping {}: {}", dir.display(), reason);
        self.diagnostics.push(Diagnostic::UnreadableDirectory {
            path: dir.display().to_string(),
            reason,
        });
    }

    /// Whether `dir`, whose entries are `entries`, is a table root.
    fn is_table(&mut self, dir: &Path, entries: &[DirEntry], is_root: bool) -> bool {
        let has_log_dir = entries
            .iter()
            .any(|e| e.is_directory && e.name == LOG_DIR_NAME);
        if !has_log_dir {
            return false;
        }
        if is_root {
            return true;
        }

        let log_dir = dir.join(LOG_DIR_NAME);
        match self.fs.list_entries(&log_dir) {
            Ok(log_entries) => log_entries
                .iter()
                .any(|e| !e.is_directory && is_commit_file(&e.name)),
            Err(e) => {
                self.unreadable(&log_dir, e.to_string());
                false
            }
        }
    }

    fn push_children(&mut self, dir: &Path, entries: &[DirEntry]) {
        let mut children: Vec<PathBuf> = entries
            .iter()
            .filter(|e| e.is_directory && e.name != LOG_DIR_NAME)
            .map(|e| dir.join(&e.name))
            .filter(|child| match self.filter {
                Some(filter) if filter.is_excluded(child) => {
                    log::debug!("Excluded {}", child.display());
                    false
                }
                _ => true,
            })
            .collect();

        // popped in ascending order
        children.sort_unstable_by(|a, b| b.cmp(a));
        self.stack.extend(children);
    }
}

impl Iterator for Discovery<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        while let Some(dir) = self.stack.pop() {
            let identity = self.fs.canonicalize(&dir).unwrap_or_else(|_| dir.clone());
            if !self.visited.insert(identity) {
                log::debug!("Already visited {}", dir.display());
                continue;
            }

            let entries = match self.fs.list_entries(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    self.unreadable(&dir, e.to_string());
                    continue;
                }
            };

            let is_root = dir == self.root;
            if self.is_table(&dir, &entries, is_root) {
                log::debug!("Found table at {}", dir.display());
                return Some(dir);
            }

            if self.recursive {
                self.push_children(&dir, &entries);
            }
        }

        None
    }
}
