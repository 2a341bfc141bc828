//! Decoding of commit files into typed actions.
//!
//! A commit is newline-delimited JSON; each line holds one action keyed by its
//! kind (`{"add": {...}}`, `{"commitInfo": {...}}`, ...). Only the kinds that
//! carry statistics are modelled; protocol, metadata, txn and every other kind
//! decode to [`Action::Other`] so newer writers do not break older readers.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One action of a commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add(AddFile),
    Remove(RemoveFile),
    CommitInfo(CommitInfo),
    Other,
}

/// A data file added to the table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFile {
    pub path: String,

    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub modification_time: i64,

    #[serde(default = "default_data_change")]
    pub data_change: bool,

    /// Per-file statistics, itself a JSON document encoded as a string.
    #[serde(default)]
    pub stats: Option<String>,
}

/// A data file logically removed from the table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFile {
    pub path: String,

    #[serde(default)]
    pub size: Option<u64>,

    #[serde(default)]
    pub deletion_timestamp: Option<i64>,

    #[serde(default = "default_data_change")]
    pub data_change: bool,

    #[serde(default)]
    pub stats: Option<String>,
}

/// Commit-level provenance written by the engine that produced the commit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    #[serde(default)]
    pub timestamp: Option<i64>,

    #[serde(default)]
    pub in_commit_timestamp: Option<i64>,

    #[serde(default)]
    pub operation: Option<String>,

    /// Engine-specific metrics; values are numbers or numeric strings
    /// depending on the writer.
    #[serde(default)]
    pub operation_metrics: Option<Map<String, Value>>,
}

fn default_data_change() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileStats {
    #[serde(default)]
    num_records: Option<u64>,
}

/// `numRecords` from a JSON-encoded statistics string.
pub(crate) fn stats_num_records(stats: Option<&str>) -> Option<u64> {
    let stats = stats?;
    serde_json::from_str::<FileStats>(stats)
        .ok()
        .and_then(|s| s.num_records)
}

impl AddFile {
    /// Row count from the file statistics, if recorded.
    pub fn num_records(&self) -> Option<u64> {
        stats_num_records(self.stats.as_deref())
    }
}

impl RemoveFile {
    pub fn num_records(&self) -> Option<u64> {
        stats_num_records(self.stats.as_deref())
    }
}

// Spark writes camelCase metric names, delta-rs writes snake_case.
const ROWS_ADDED_KEYS: &[&str] = &[
    "numAddedRows",
    "numTargetRowsInserted",
    "num_added_rows",
    "num_target_rows_inserted",
];
const ROWS_DELETED_KEYS: &[&str] = &[
    "numDeletedRows",
    "numTargetRowsDeleted",
    "num_deleted_rows",
    "num_target_rows_deleted",
];
const ROWS_COPIED_KEYS: &[&str] = &[
    "numCopiedRows",
    "numTargetRowsCopied",
    "num_copied_rows",
    "num_target_rows_copied",
];
const FILES_ADDED_KEYS: &[&str] = &[
    "numAddedFiles",
    "numFilesAdded",
    "numTargetFilesAdded",
    "num_added_files",
    "num_target_files_added",
];
const FILES_REMOVED_KEYS: &[&str] = &[
    "numRemovedFiles",
    "numFilesRemoved",
    "numTargetFilesRemoved",
    "numDeletedFiles",
    "num_removed_files",
    "num_target_files_removed",
    "num_deleted_files",
];
const OUTPUT_ROWS_KEYS: &[&str] = &["numOutputRows", "num_output_rows"];

/// The output row count includes rewritten rows as well for these operations.
const REWRITE_KEYS: &[&str] = &[
    "numCopiedRows",
    "numUpdatedRows",
    "numTargetRowsCopied",
    "numTargetRowsUpdated",
    "num_copied_rows",
    "num_updated_rows",
    "num_target_rows_copied",
    "num_target_rows_updated",
];

/// Row-level metrics reported by a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMetrics {
    pub added: Option<u64>,
    pub deleted: Option<u64>,
    pub copied: Option<u64>,
}

fn metric_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl CommitInfo {
    /// Whether the commit carries any operation metrics at all.
    pub fn has_metrics(&self) -> bool {
        self.operation_metrics
            .as_ref()
            .is_some_and(|m| !m.is_empty())
    }

    /// First metric among `keys` that parses as a non-negative integer.
    pub fn metric(&self, keys: &[&str]) -> Option<u64> {
        let metrics = self.operation_metrics.as_ref()?;
        keys.iter()
            .find_map(|key| metrics.get(*key).and_then(metric_value))
    }

    fn has_any_metric(&self, keys: &[&str]) -> bool {
        self.operation_metrics
            .as_ref()
            .is_some_and(|m| keys.iter().any(|key| m.contains_key(*key)))
    }

    pub fn row_metrics(&self) -> RowMetrics {
        let added = self.metric(ROWS_ADDED_KEYS).or_else(|| {
            if self.has_any_metric(REWRITE_KEYS) {
                None
            } else {
                self.metric(OUTPUT_ROWS_KEYS)
            }
        });

        RowMetrics {
            added,
            deleted: self.metric(ROWS_DELETED_KEYS),
            copied: self.metric(ROWS_COPIED_KEYS),
        }
    }

    /// `(files_added, files_removed)` as reported by metrics.
    pub fn file_metrics(&self) -> (Option<u64>, Option<u64>) {
        (self.metric(FILES_ADDED_KEYS), self.metric(FILES_REMOVED_KEYS))
    }

    /// Commit time, preferring the in-commit timestamp when the table has
    /// that feature enabled.
    pub fn commit_timestamp(&self) -> Option<i64> {
        self.in_commit_timestamp.or(self.timestamp)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    #[serde(default)]
    add: Option<AddFile>,
    #[serde(default)]
    remove: Option<RemoveFile>,
    #[serde(default)]
    commit_info: Option<CommitInfo>,
}

/// A line of a commit file that is not a valid action object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

/// Decode every action of a commit file.
pub fn parse_commit(contents: &[u8]) -> Result<Vec<Action>, MalformedLine> {
    let mut actions = Vec::new();

    for (idx, raw_line) in contents.split(|b| *b == b'\n').enumerate() {
        let line = std::str::from_utf8(raw_line).map_err(|e| MalformedLine {
            line: idx + 1,
            reason: format!("invalid UTF-8: {e}"),
        })?;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let raw: RawAction = serde_json::from_str(line).map_err(|e| MalformedLine {
            line: idx + 1,
            reason: e.to_string(),
        })?;

        let before = actions.len();
        if let Some(add) = raw.add {
            actions.push(Action::Add(add));
        }
        if let Some(remove) = raw.remove {
            actions.push(Action::Remove(remove));
        }
        if let Some(commit_info) = raw.commit_info {
            actions.push(Action::CommitInfo(commit_info));
        }
        if actions.len() == before {
            actions.push(Action::Other);
        }
    }

    Ok(actions)
}
