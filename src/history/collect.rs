//! History collection across tables.
//!
//! Discovery runs once on the calling thread. The tables it finds are sorted,
//! optionally paginated, and then read and aggregated in parallel, one rayon
//! task per table. Each task owns its reader and accumulator; the only state
//! shared between tasks is the read-only filesystem and the cancellation flag.

use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::aggregate::{aggregate_from, opening_totals};
use super::record::TableHistory;
use crate::cancel::CancellationToken;
use crate::delta::LogReader;
use crate::discovery::{discover, table_root_of};
use crate::error::{HistoryError, Result};
use crate::filter::DiscoveryFilter;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::report::{Diagnostic, HistoryReport};

/// Versions returned per table when the caller does not say otherwise.
pub const DEFAULT_LIMIT: i64 = 10;

/// 1-based page of the sorted table list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub size: usize,
    pub number: usize,
}

/// Parameters of one history collection.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub root: PathBuf,
    pub recursive: bool,
    /// Most recent versions kept per table; `None` keeps everything.
    pub limit: Option<i64>,
    pub page: Option<Page>,
    /// Size of a dedicated worker pool; `None` uses the global rayon pool.
    pub workers: Option<usize>,
    pub use_checkpoints: bool,
    pub filter: DiscoveryFilter,
    pub cancel: CancellationToken,
}

impl HistoryRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            limit: Some(DEFAULT_LIMIT),
            page: None,
            workers: None,
            use_checkpoints: true,
            filter: DiscoveryFilter::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn page(mut self, size: usize, number: usize) -> Self {
        self.page = Some(Page { size, number });
        self
    }

    pub fn workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn use_checkpoints(mut self, enabled: bool) -> Self {
        self.use_checkpoints = enabled;
        self
    }

    pub fn filter(mut self, filter: DiscoveryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Check every argument before any table is touched.
    fn validate(&self, fs: &dyn FileSystem) -> Result<Option<usize>> {
        let limit = match self.limit {
            None => None,
            Some(n) if n <= 0 => {
                return Err(HistoryError::InvalidArgument(format!(
                    "limit must be a positive integer, got {n}"
                )))
            }
            Some(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        };

        if let Some(page) = self.page {
            if page.size == 0 || page.number == 0 {
                return Err(HistoryError::InvalidArgument(format!(
                    "page size and page number must be positive, got size {} page {}",
                    page.size, page.number
                )));
            }
        }

        if self.workers == Some(0) {
            return Err(HistoryError::InvalidArgument(
                "worker count must be positive".to_string(),
            ));
        }

        validate_root(fs, &self.root)?;
        Ok(limit)
    }
}

/// Fail with `InvalidArgument` unless `root` is a listable directory.
pub(crate) fn validate_root(fs: &dyn FileSystem, root: &Path) -> Result<()> {
    let root = table_root_of(root);
    match fs.list_entries(&root) {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => Err(HistoryError::InvalidArgument(format!(
            "path does not exist: {}",
            root.display()
        ))),
        Err(e) => Err(HistoryError::InvalidArgument(format!(
            "cannot read {}: {}",
            root.display(),
            e
        ))),
    }
}

/// Run `op` on a dedicated pool of `workers` threads, or on the global pool.
pub(crate) fn run_on_pool<T, F>(workers: Option<usize>, op: F) -> Result<T>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match workers {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?;
            Ok(pool.install(op))
        }
        None => Ok(op()),
    }
}

fn paginate(tables: Vec<PathBuf>, page: Option<Page>) -> Vec<PathBuf> {
    match page {
        Some(page) => tables
            .into_iter()
            .skip((page.number - 1).saturating_mul(page.size))
            .take(page.size)
            .collect(),
        None => tables,
    }
}

/// Discover tables under the request root and rebuild their history.
///
/// Returns an error only for invalid arguments, a failed worker pool or
/// cancellation. Problems confined to one table leave that table's history
/// short or empty and are listed in [`HistoryReport::diagnostics`].
pub fn collect_history(fs: &dyn FileSystem, request: &HistoryRequest) -> Result<HistoryReport> {
    let limit = request.validate(fs)?;
    request.cancel.check()?;

    let (tables, mut diagnostics) = discover(fs, &request.root, request.recursive)
        .with_filter(&request.filter)
        .collect_sorted();
    let total_tables = tables.len();
    let tables = paginate(tables, request.page);

    log::debug!(
        "Discovered {} tables under {}, reading {}",
        total_tables,
        request.root.display(),
        tables.len()
    );

    let outcomes = run_on_pool(request.workers, || {
        tables
            .par_iter()
            .map(|table| table_history(fs, table, limit, request))
            .collect::<Result<Vec<_>>>()
    })??;

    let mut histories = Vec::with_capacity(outcomes.len());
    for (history, table_diagnostics) in outcomes {
        histories.push(history);
        diagnostics.extend(table_diagnostics);
    }

    Ok(HistoryReport {
        tables: histories,
        diagnostics,
        total_tables,
    })
}

/// Read and aggregate one table. Only cancellation is returned as an error.
fn table_history(
    fs: &dyn FileSystem,
    table: &Path,
    limit: Option<usize>,
    request: &HistoryRequest,
) -> Result<(TableHistory, Vec<Diagnostic>)> {
    let name = table.display().to_string();
    let reader = LogReader::new(fs, table)
        .with_checkpoints(request.use_checkpoints)
        .with_cancellation(&request.cancel);

    let segment = match reader.read() {
        Ok(segment) => segment,
        Err(HistoryError::Cancelled) => return Err(HistoryError::Cancelled),
        Err(e) => {
            log::warn!("{}: {}", name, e);
            let diagnostic = Diagnostic::UnreadableLog {
                table: name.clone(),
                reason: e.to_string(),
            };
            return Ok((TableHistory::empty(name), vec![diagnostic]));
        }
    };

    let mut diagnostics = segment.diagnostics;
    let aggregated = opening_totals(segment.checkpoint.as_ref(), &segment.entries)
        .and_then(|opening| aggregate_from(opening, &segment.entries));

    let operations = match aggregated {
        Ok(mut records) => {
            records.reverse();
            if let Some(limit) = limit {
                records.truncate(limit);
            }
            records
        }
        Err(e) => {
            log::error!("{}: {}", name, e);
            diagnostics.push(Diagnostic::InconsistentLog {
                table: name.clone(),
                reason: e.to_string(),
            });
            Vec::new()
        }
    };

    Ok((TableHistory::new(name, operations), diagnostics))
}

/// History of every table under `path` on the local filesystem, most recent
/// version first, at most `limit` versions per table.
///
/// `None` returns every version. Pass `Some(DEFAULT_LIMIT)` for the usual
/// ten most recent, which is what [`HistoryRequest::new`] applies.
///
/// Diagnostics are logged; use [`collect_history`] to receive them.
pub fn get_table_history(
    path: impl AsRef<Path>,
    recursive: bool,
    limit: Option<i64>,
) -> Result<Vec<TableHistory>> {
    let request = HistoryRequest::new(path.as_ref())
        .recursive(recursive)
        .limit(limit);
    let report = collect_history(&LocalFileSystem, &request)?;

    for diagnostic in &report.diagnostics {
        log::warn!("{}", diagnostic);
    }

    Ok(report.tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::naming::commit_file_name;
    use crate::delta::LOG_DIR_NAME;
    use std::fs;
    use tempfile::TempDir;

    fn write_versions(table: &Path, count: u64) {
        let log_dir = table.join(LOG_DIR_NAME);
        fs::create_dir_all(&log_dir).unwrap();
        for version in 0..count {
            let body = format!(
                "{{\"add\":{{\"path\":\"f{version}\",\"size\":10,\"stats\":\"{{\\\"numRecords\\\":2}}\"}}}}\n{{\"commitInfo\":{{\"timestamp\":{version}}}}}\n"
            );
            fs::write(log_dir.join(commit_file_name(version)), body).unwrap();
        }
    }

    #[test]
    fn test_limit_keeps_most_recent() {
        let temp = TempDir::new().unwrap();
        write_versions(temp.path(), 15);

        let histories = get_table_history(temp.path(), false, Some(DEFAULT_LIMIT)).unwrap();
        assert_eq!(histories.len(), 1);

        let versions: Vec<u64> = histories[0].operations.iter().map(|r| r.version).collect();
        assert_eq!(versions, (5..15).rev().collect::<Vec<_>>());
        assert_eq!(histories[0].operations[0].total_rows, 30);
        assert_eq!(histories[0].operations[0].total_bytes, 150);
    }

    #[test]
    fn test_no_limit_returns_everything() {
        let temp = TempDir::new().unwrap();
        write_versions(temp.path(), 12);

        let histories = get_table_history(temp.path(), false, None).unwrap();
        assert_eq!(histories[0].operations.len(), 12);
        assert_eq!(histories[0].operations.last().unwrap().version, 0);
    }

    #[test]
    fn test_non_positive_limits_are_rejected() {
        let temp = TempDir::new().unwrap();
        write_versions(temp.path(), 1);

        for limit in [0, -1] {
            let err = get_table_history(temp.path(), false, Some(limit)).unwrap_err();
            assert!(matches!(err, HistoryError::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_missing_root_is_invalid() {
        let temp = TempDir::new().unwrap();
        let err = get_table_history(temp.path().join("missing"), true, None).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_page_is_invalid() {
        let temp = TempDir::new().unwrap();
        let request = HistoryRequest::new(temp.path()).page(0, 1);
        assert!(matches!(
            collect_history(&LocalFileSystem, &request),
            Err(HistoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pagination_slices_sorted_tables() {
        let temp = TempDir::new().unwrap();
        for name in ["a", "b", "c", "d", "e"] {
            write_versions(&temp.path().join(name), 1);
        }

        let request = HistoryRequest::new(temp.path()).recursive(true).page(2, 2);
        let report = collect_history(&LocalFileSystem, &request).unwrap();

        let paths: Vec<PathBuf> = report.tables.iter().map(|t| PathBuf::from(&t.path)).collect();
        assert_eq!(paths, vec![temp.path().join("c"), temp.path().join("d")]);
        assert_eq!(report.total_tables, 5);

        let past_end = HistoryRequest::new(temp.path()).recursive(true).page(2, 9);
        assert!(collect_history(&LocalFileSystem, &past_end).unwrap().is_empty());
    }

    #[test]
    fn test_dedicated_pool() {
        let temp = TempDir::new().unwrap();
        write_versions(&temp.path().join("a"), 2);
        write_versions(&temp.path().join("b"), 3);

        let request = HistoryRequest::new(temp.path())
            .recursive(true)
            .workers(Some(2));
        let report = collect_history(&LocalFileSystem, &request).unwrap();
        assert_eq!(report.tables.len(), 2);
        assert_eq!(report.tables[1].operations.len(), 3);
    }

    #[test]
    fn test_cancelled_request() {
        let temp = TempDir::new().unwrap();
        write_versions(temp.path(), 1);

        let token = CancellationToken::new();
        token.cancel();
        let request = HistoryRequest::new(temp.path()).cancellation(token);
        assert!(matches!(
            collect_history(&LocalFileSystem, &request),
            Err(HistoryError::Cancelled)
        ));
    }
}
