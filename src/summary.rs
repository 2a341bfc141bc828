//! Current-state summaries of tables.
//!
//! Where history looks at what each version changed, a summary looks at what
//! the latest version contains: the active files after replaying the log
//! from the newest checkpoint.

use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::delta::checkpoint::read_last_checkpoint;
use crate::delta::{Action, ActiveFile, CheckpointFiles, CheckpointState, LogListing, LogReader};
use crate::discovery::discover;
use crate::error::{HistoryError, Result};
use crate::filter::DiscoveryFilter;
use crate::fs::FileSystem;
use crate::history::{run_on_pool, validate_root};

/// Distribution of active file sizes in bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSizeStats {
    pub min: u64,
    pub p25: u64,
    pub median: u64,
    pub p75: u64,
    pub max: u64,
    pub mean: f64,
}

impl FileSizeStats {
    /// `None` when there are no files.
    pub fn from_sizes(mut sizes: Vec<u64>) -> Option<Self> {
        if sizes.is_empty() {
            return None;
        }
        sizes.sort_unstable();
        let sum: f64 = sizes.iter().map(|&s| s as f64).sum();

        Some(Self {
            min: sizes[0],
            p25: percentile(&sizes, 0.25),
            median: percentile(&sizes, 0.5),
            p75: percentile(&sizes, 0.75),
            max: sizes[sizes.len() - 1],
            mean: sum / sizes.len() as f64,
        })
    }
}

/// Nearest-rank percentile of a sorted, non-empty slice.
fn percentile(sorted: &[u64], p: f64) -> u64 {
    let idx = (p * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Snapshot of one table at its latest version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub path: String,
    pub version: u64,
    pub num_files: usize,
    /// Latest modification time of an active file, epoch milliseconds
    pub last_modified: i64,
    pub total_rows: i64,
    pub total_size: u64,
    pub file_size_stats: Option<FileSizeStats>,
}

impl TableSummary {
    fn from_state(path: String, version: u64, state: &CheckpointState) -> Result<Self> {
        let files: Vec<&ActiveFile> = state.files.values().collect();
        let total_size = files
            .iter()
            .try_fold(0u64, |sum, f| sum.checked_add(f.size))
            .ok_or(HistoryError::Overflow { version })?;

        Ok(Self {
            path,
            version,
            num_files: files.len(),
            last_modified: files.iter().map(|f| f.modification_time).max().unwrap_or(0),
            total_rows: state.total_rows().ok_or(HistoryError::Overflow { version })?,
            total_size,
            file_size_stats: FileSizeStats::from_sizes(files.iter().map(|f| f.size).collect()),
        })
    }
}

/// Options for [`summarize_tables`].
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub use_checkpoints: bool,
    pub workers: Option<usize>,
    pub filter: DiscoveryFilter,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            use_checkpoints: true,
            workers: None,
            filter: DiscoveryFilter::default(),
        }
    }
}

/// Summarize every table under `root`, sorted by path.
///
/// Tables whose log cannot be read are skipped with a warning.
pub fn summarize_tables(
    fs: &dyn FileSystem,
    root: &Path,
    recursive: bool,
    options: &SummaryOptions,
) -> Result<Vec<TableSummary>> {
    if options.workers == Some(0) {
        return Err(HistoryError::InvalidArgument(
            "worker count must be positive".to_string(),
        ));
    }
    validate_root(fs, root)?;

    let (tables, diagnostics) = discover(fs, root, recursive)
        .with_filter(&options.filter)
        .collect_sorted();
    for diagnostic in &diagnostics {
        log::warn!("{}", diagnostic);
    }

    let summaries = run_on_pool(options.workers, || {
        tables
            .par_iter()
            .filter_map(|table| match summarize_table(fs, table, options.use_checkpoints) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    log::warn!("Skipping {}: {}", table.display(), e);
                    None
                }
            })
            .collect::<Vec<_>>()
    })?;

    Ok(summaries)
}

/// Replay the log of one table from its newest usable checkpoint.
pub fn summarize_table(fs: &dyn FileSystem, table: &Path, use_checkpoints: bool) -> Result<TableSummary> {
    let reader = LogReader::new(fs, table).with_checkpoints(use_checkpoints);
    let listing = reader.list()?;

    let mut state = CheckpointState::default();
    let mut base: Option<u64> = None;
    if use_checkpoints {
        if let Some(files) = starting_checkpoint(fs, &reader, &listing)? {
            match reader.load_checkpoint(files) {
                Ok(loaded) => {
                    base = Some(loaded.version);
                    state = loaded;
                }
                Err(e) => log::warn!("{}: {}; replaying the full log", table.display(), e),
            }
        }
    }

    let mut version = base.unwrap_or(0);
    for &commit in listing.commits.iter().filter(|v| base.map_or(true, |b| **v > b)) {
        let actions = match reader.read_commit(commit) {
            Ok(actions) => actions,
            Err(e @ (HistoryError::CorruptCommit { .. } | HistoryError::Io { .. })) => {
                log::warn!("{}: summary stops at version {}: {}", table.display(), version, e);
                break;
            }
            Err(e) => return Err(e),
        };

        for action in &actions {
            match action {
                Action::Add(add) => {
                    state.files.insert(add.path.clone(), ActiveFile::from(add));
                }
                Action::Remove(remove) => {
                    state.files.remove(&remove.path);
                }
                Action::CommitInfo(_) | Action::Other => {}
            }
        }
        version = commit;
    }

    TableSummary::from_state(table.display().to_string(), version, &state)
}

/// The `_last_checkpoint` target when present and complete, else the newest
/// complete checkpoint in the listing.
fn starting_checkpoint<'l>(
    fs: &dyn FileSystem,
    reader: &LogReader<'_>,
    listing: &'l LogListing,
) -> Result<Option<&'l CheckpointFiles>> {
    if listing.has_last_checkpoint {
        if let Some(hint) = read_last_checkpoint(fs, reader.log_dir())? {
            if let Some(files) = listing
                .checkpoints
                .get(&hint.version)
                .filter(|c| c.is_complete())
            {
                return Ok(Some(files));
            }
            log::debug!("Checkpoint {} from hint not found, scanning listing", hint.version);
        }
    }
    Ok(listing.latest_complete_checkpoint())
}
