use super::actions::{Action, AddFile, CommitInfo, RemoveFile};

/// Statistics of one committed table version.
///
/// Optional fields are `None` when the commit recorded nothing for them,
/// which is different from recording zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEntry {
    pub version: u64,
    /// Commit time in milliseconds since the epoch, as written by the producer.
    pub timestamp: i64,
    pub operation: Option<String>,
    pub files_added: Option<u64>,
    pub files_removed: Option<u64>,
    pub rows_added: Option<u64>,
    pub rows_deleted: Option<u64>,
    pub rows_copied: Option<u64>,
    pub bytes_added: u64,
    pub bytes_removed: u64,
}

impl LogEntry {
    /// Fold the actions of one commit into its entry.
    pub fn from_actions(version: u64, actions: &[Action]) -> Self {
        let mut adds: Vec<&AddFile> = Vec::new();
        let mut removes: Vec<&RemoveFile> = Vec::new();
        let mut commit_info: Option<&CommitInfo> = None;

        for action in actions {
            match action {
                Action::Add(add) => adds.push(add),
                Action::Remove(remove) => removes.push(remove),
                Action::CommitInfo(info) => commit_info = Some(info),
                Action::Other => {}
            }
        }

        let bytes_added = adds.iter().fold(0u64, |sum, a| sum.saturating_add(a.size));
        let bytes_removed = removes
            .iter()
            .fold(0u64, |sum, r| sum.saturating_add(r.size.unwrap_or(0)));

        let (files_added, files_removed) = if adds.is_empty() && removes.is_empty() {
            commit_info
                .map(|info| info.file_metrics())
                .unwrap_or((None, None))
        } else {
            (Some(adds.len() as u64), Some(removes.len() as u64))
        };

        let (rows_added, rows_deleted, rows_copied) = match commit_info {
            Some(info) if info.has_metrics() => {
                let rows = info.row_metrics();
                (rows.added, rows.deleted, rows.copied)
            }
            _ => (
                inferred_rows(adds.iter().filter(|a| a.data_change).map(|a| a.num_records())),
                inferred_rows(removes.iter().filter(|r| r.data_change).map(|r| r.num_records())),
                None,
            ),
        };

        let timestamp = commit_info
            .and_then(CommitInfo::commit_timestamp)
            .or_else(|| {
                let added = adds.iter().map(|a| a.modification_time);
                let removed = removes.iter().filter_map(|r| r.deletion_timestamp);
                added.chain(removed).max()
            })
            .unwrap_or(0);

        LogEntry {
            version,
            timestamp,
            operation: commit_info.and_then(|info| info.operation.clone()),
            files_added,
            files_removed,
            rows_added,
            rows_deleted,
            rows_copied,
            bytes_added,
            bytes_removed,
        }
    }

    /// Net row change, absent counts contributing 0. `None` when a count
    /// does not fit in an `i64`.
    pub fn row_delta(&self) -> Option<i64> {
        net(self.rows_added.unwrap_or(0), self.rows_deleted.unwrap_or(0))
    }

    pub fn byte_delta(&self) -> Option<i64> {
        net(self.bytes_added, self.bytes_removed)
    }
}

fn net(added: u64, removed: u64) -> Option<i64> {
    i64::try_from(added)
        .ok()?
        .checked_sub(i64::try_from(removed).ok()?)
}

/// Sum of per-file row counts; unknown unless every file recorded one.
fn inferred_rows(counts: impl Iterator<Item = Option<u64>>) -> Option<u64> {
    let mut total = 0u64;
    let mut seen = false;
    for count in counts {
        total = total.saturating_add(count?);
        seen = true;
    }
    seen.then_some(total)
}
