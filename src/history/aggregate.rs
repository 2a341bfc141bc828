//! Folding ordered log entries into operation records with running totals.
//!
//! Totals are owned by one [`Accumulator`] per table and never shared, so
//! tables can be aggregated on different threads. Within a table the fold is
//! strictly sequential.

use super::record::OperationRecord;
use crate::delta::{CheckpointState, LogEntry};
use crate::error::{HistoryError, Result};

/// Table-lifetime row and byte totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub rows: i64,
    pub bytes: i64,
}

impl Totals {
    /// Totals once `entry` is applied; `None` on overflow.
    pub fn after(self, entry: &LogEntry) -> Option<Self> {
        Some(Self {
            rows: self.rows.checked_add(entry.row_delta()?)?,
            bytes: self.bytes.checked_add(entry.byte_delta()?)?,
        })
    }

    pub fn before(self, entry: &LogEntry) -> Option<Self> {
        Some(Self {
            rows: self.rows.checked_sub(entry.row_delta()?)?,
            bytes: self.bytes.checked_sub(entry.byte_delta()?)?,
        })
    }
}

/// Running totals of one table.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    totals: Totals,
    last_version: Option<u64>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from totals carried over from versions that are not replayed.
    pub fn starting_at(totals: Totals) -> Self {
        Self {
            totals,
            last_version: None,
        }
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn last_version(&self) -> Option<u64> {
        self.last_version
    }

    /// Apply the next entry. Versions must strictly increase.
    pub fn apply(&mut self, entry: &LogEntry) -> Result<OperationRecord> {
        if let Some(previous) = self.last_version {
            if entry.version <= previous {
                return Err(HistoryError::InternalConsistency {
                    previous,
                    version: entry.version,
                });
            }
        }

        self.totals = self.totals.after(entry).ok_or(HistoryError::Overflow {
            version: entry.version,
        })?;
        self.last_version = Some(entry.version);

        Ok(OperationRecord::new(entry, self.totals))
    }
}

/// Aggregate a log that starts at version 0. Output is ascending.
pub fn aggregate(entries: &[LogEntry]) -> Result<Vec<OperationRecord>> {
    aggregate_from(Totals::default(), entries)
}

pub fn aggregate_from(opening: Totals, entries: &[LogEntry]) -> Result<Vec<OperationRecord>> {
    let mut acc = Accumulator::starting_at(opening);
    entries.iter().map(|entry| acc.apply(entry)).collect()
}

/// Totals just before the first of `entries`.
///
/// With a checkpoint, its state is rewound over the entries it already
/// includes. Without one the opening totals are zero.
pub fn opening_totals(checkpoint: Option<&CheckpointState>, entries: &[LogEntry]) -> Result<Totals> {
    let Some(checkpoint) = checkpoint else {
        return Ok(Totals::default());
    };

    let overflow = |version| HistoryError::Overflow { version };
    let at_checkpoint = Totals {
        rows: checkpoint.total_rows().ok_or(overflow(checkpoint.version))?,
        bytes: checkpoint.total_bytes().ok_or(overflow(checkpoint.version))?,
    };

    entries
        .iter()
        .take_while(|e| e.version <= checkpoint.version)
        .try_fold(at_checkpoint, |totals, e| {
            totals.before(e).ok_or(overflow(e.version))
        })
}
