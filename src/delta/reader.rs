//! Reading one table's transaction log.
//!
//! [`LogReader`] owns every storage interaction under `<root>/_delta_log/`:
//! - listing the directory and ordering commits by the version in their name,
//! - decoding each commit into a [`LogEntry`],
//! - stopping at the first unreadable or missing commit and reporting where
//!   the history was cut,
//! - loading a checkpoint as the starting state when the commits needed to
//!   replay from version 0 have been cleaned up.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::actions::{parse_commit, Action};
use super::checkpoint::{read_checkpoint, CheckpointFiles, CheckpointState};
use super::entry::LogEntry;
use super::naming::{commit_file_name, LogFileName, LOG_DIR_NAME};
use crate::cancel::CancellationToken;
use crate::error::{HistoryError, Result};
use crate::fs::FileSystem;
use crate::report::Diagnostic;

/// Recognized files of a log directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogListing {
    /// Commit versions, ascending and unique.
    pub commits: Vec<u64>,
    pub checkpoints: BTreeMap<u64, CheckpointFiles>,
    pub has_last_checkpoint: bool,
}

impl LogListing {
    pub fn latest_commit(&self) -> Option<u64> {
        self.commits.last().copied()
    }

    /// Newest checkpoint with every part present.
    pub fn latest_complete_checkpoint(&self) -> Option<&CheckpointFiles> {
        self.checkpoints.values().rev().find(|c| c.is_complete())
    }

    /// Oldest complete checkpoint within `from..=to`.
    pub fn first_complete_checkpoint_in(&self, from: u64, to: u64) -> Option<&CheckpointFiles> {
        if from > to {
            return None;
        }
        self.checkpoints
            .range(from..=to)
            .map(|(_, files)| files)
            .find(|c| c.is_complete())
    }
}

/// Ordered entries read from one table's log.
#[derive(Debug, Clone, Default)]
pub struct LogSegment {
    /// Strictly ascending by version, contiguous.
    pub entries: Vec<LogEntry>,
    /// Table state used as the starting point when the log does not reach
    /// back to version 0.
    pub checkpoint: Option<CheckpointState>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LogSegment {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_version(&self) -> Option<u64> {
        self.entries.first().map(|e| e.version)
    }
}

/// Reader for the log of a single table.
pub struct LogReader<'a> {
    fs: &'a dyn FileSystem,
    table_root: PathBuf,
    log_dir: PathBuf,
    use_checkpoints: bool,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> LogReader<'a> {
    pub fn new(fs: &'a dyn FileSystem, table_root: impl Into<PathBuf>) -> Self {
        let table_root = table_root.into();
        let log_dir = table_root.join(LOG_DIR_NAME);
        Self {
            fs,
            table_root,
            log_dir,
            use_checkpoints: true,
            cancel: None,
        }
    }

    pub fn with_checkpoints(mut self, enabled: bool) -> Self {
        self.use_checkpoints = enabled;
        self
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn table_root(&self) -> &Path {
        &self.table_root
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn table_name(&self) -> String {
        self.table_root.display().to_string()
    }

    /// List the log directory. A missing directory is an empty listing.
    pub fn list(&self) -> Result<LogListing> {
        let entries = match self.fs.list_entries(&self.log_dir) {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok(LogListing::default()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.log_dir.clone(),
                    source,
                })
            }
        };

        let mut listing = LogListing::default();
        for entry in entries.iter().filter(|e| !e.is_directory) {
            match LogFileName::parse(&entry.name) {
                Some(LogFileName::Commit { version }) => listing.commits.push(version),
                Some(LogFileName::Checkpoint { version, part }) => listing
                    .checkpoints
                    .entry(version)
                    .or_insert_with(|| CheckpointFiles::new(version))
                    .add_file(&entry.name, part),
                Some(LogFileName::LastCheckpoint) => listing.has_last_checkpoint = true,
                None => {}
            }
        }
        listing.commits.sort_unstable();
        listing.commits.dedup();

        Ok(listing)
    }

    /// Decode the actions of the commit for `version`.
    pub fn read_commit(&self, version: u64) -> Result<Vec<Action>> {
        let path = self.log_dir.join(commit_file_name(version));
        let contents = self.fs.read_file(&path).map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })?;

        parse_commit(&contents).map_err(|bad| HistoryError::CorruptCommit {
            version,
            path,
            line: bad.line,
            reason: bad.reason,
        })
    }

    pub fn read_entry(&self, version: u64) -> Result<LogEntry> {
        let actions = self.read_commit(version)?;
        Ok(LogEntry::from_actions(version, &actions))
    }

    pub fn load_checkpoint(&self, files: &CheckpointFiles) -> Result<CheckpointState> {
        read_checkpoint(self.fs, &self.log_dir, files)
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }

    /// Read every retained commit in version order.
    ///
    /// Failures confined to one commit end the segment at the previous
    /// version and are recorded in [`LogSegment::diagnostics`]; only listing
    /// failures and cancellation are returned as errors.
    pub fn read(&self) -> Result<LogSegment> {
        let listing = self.list()?;
        let mut segment = LogSegment::default();

        if listing.commits.is_empty() {
            log::debug!("No commits under {}", self.log_dir.display());
            return Ok(segment);
        }

        let mut expected: Option<u64> = None;
        for &version in &listing.commits {
            self.check_cancelled()?;

            if let Some(expected) = expected.filter(|e| *e != version) {
                let reason = format!("commit file for version {expected} is missing");
                log::warn!("{}: {}", self.table_name(), reason);
                segment.diagnostics.push(Diagnostic::TruncatedHistory {
                    table: self.table_name(),
                    version: expected,
                    reason,
                });
                break;
            }

            match self.read_entry(version) {
                Ok(entry) => segment.entries.push(entry),
                Err(e @ (HistoryError::CorruptCommit { .. } | HistoryError::Io { .. })) => {
                    log::warn!("{}: stopping at version {}: {}", self.table_name(), version, e);
                    segment.diagnostics.push(Diagnostic::TruncatedHistory {
                        table: self.table_name(),
                        version,
                        reason: e.to_string(),
                    });
                    break;
                }
                Err(e) => return Err(e),
            }
            expected = Some(version + 1);
        }

        if let Some(first) = segment.first_version().filter(|v| *v > 0) {
            self.attach_baseline(&listing, first, &mut segment);
        }

        log::debug!(
            "Read {} commits from {}",
            segment.entries.len(),
            self.log_dir.display()
        );

        Ok(segment)
    }

    fn attach_baseline(&self, listing: &LogListing, first: u64, segment: &mut LogSegment) {
        let last = segment.entries.last().map_or(first, |e| e.version);
        let candidate = if self.use_checkpoints {
            listing.first_complete_checkpoint_in(first - 1, last)
        } else {
            None
        };

        if let Some(files) = candidate {
            match self.load_checkpoint(files) {
                Ok(state) => {
                    segment.checkpoint = Some(state);
                    return;
                }
                Err(e) => {
                    log::warn!("{}: {}", self.table_name(), e);
                    segment.diagnostics.push(Diagnostic::CheckpointUnreadable {
                        table: self.table_name(),
                        version: files.version,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::warn!(
            "{}: log starts at version {} and no checkpoint covers it; totals are relative",
            self.table_name(),
            first
        );
        segment.diagnostics.push(Diagnostic::MissingBaseline {
            table: self.table_name(),
            first_version: first,
        });
    }
}
