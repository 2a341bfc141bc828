use serde::Serialize;
use serde_json::{Map, Value};

use super::aggregate::Totals;
use crate::delta::LogEntry;

/// History of a single table version: its deltas plus the table's running
/// totals after the version was committed.
///
/// Field order is the serialized order. Absent deltas serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRecord {
    pub version: u64,

    /// Commit time in milliseconds since the epoch
    pub timestamp: i64,

    pub rows_added: Option<u64>,
    pub rows_deleted: Option<u64>,

    /// Rows rewritten without a logical change (compaction, update rewrites)
    pub rows_copied: Option<u64>,

    pub files_added: Option<u64>,
    pub files_removed: Option<u64>,
    pub bytes_added: u64,
    pub bytes_removed: u64,
    pub total_rows: i64,
    pub total_bytes: i64,

    /// Operation name as written by the committing engine, e.g. `WRITE`.
    #[serde(skip)]
    pub operation: Option<String>,
}

impl OperationRecord {
    /// Record for `entry` given the totals after applying it.
    pub fn new(entry: &LogEntry, totals: Totals) -> Self {
        Self {
            version: entry.version,
            timestamp: entry.timestamp,
            rows_added: entry.rows_added,
            rows_deleted: entry.rows_deleted,
            rows_copied: entry.rows_copied,
            files_added: entry.files_added,
            files_removed: entry.files_removed,
            bytes_added: entry.bytes_added,
            bytes_removed: entry.bytes_removed,
            total_rows: totals.rows,
            total_bytes: totals.bytes,
            operation: entry.operation.clone(),
        }
    }
}

/// One table and its history, most recent version first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableHistory {
    pub path: String,
    pub operations: Vec<OperationRecord>,
}

impl TableHistory {
    pub fn new(path: impl Into<String>, operations: Vec<OperationRecord>) -> Self {
        Self {
            path: path.into(),
            operations,
        }
    }

    pub fn empty(path: impl Into<String>) -> Self {
        Self::new(path, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn latest(&self) -> Option<&OperationRecord> {
        self.operations.first()
    }

    /// Flat rows: `table_path` followed by every record field.
    pub fn rows(&self) -> Vec<Map<String, Value>> {
        self.operations
            .iter()
            .map(|record| {
                let mut row = Map::new();
                row.insert("table_path".to_string(), Value::String(self.path.clone()));
                if let Ok(Value::Object(fields)) = serde_json::to_value(record) {
                    row.extend(fields);
                }
                row
            })
            .collect()
    }
}
