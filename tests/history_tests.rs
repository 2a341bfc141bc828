//! End-to-end history collection over tables written to a temp directory.

mod common;

use common::{add, commit_info, linear_table, protocol, remove, CheckpointAdd, TableFixture};
use lakeview::fs::LocalFileSystem;
use lakeview::{
    collect_history, get_table_history, Diagnostic, HistoryError, HistoryRequest,
    OperationRecord,
};
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

fn versions(records: &[OperationRecord]) -> Vec<u64> {
    records.iter().map(|r| r.version).collect()
}

fn totals(records: &[OperationRecord]) -> Vec<(u64, i64, i64)> {
    records
        .iter()
        .map(|r| (r.version, r.total_rows, r.total_bytes))
        .collect()
}

#[test]
fn test_running_totals_across_write_delete_and_compaction() {
    let temp = TempDir::new().unwrap();
    let table = TableFixture::create(temp.path());
    table
        .commit(
            0,
            &[
                protocol(),
                add("a.parquet", 1000, 100),
                commit_info(1000, "WRITE", &[("numAddedRows", 100), ("numAddedFiles", 1)]),
            ],
        )
        .commit(
            1,
            &[
                add("b.parquet", 500, 50),
                remove("x.parquet", 100, 10),
                commit_info(
                    2000,
                    "MERGE",
                    &[("numTargetRowsInserted", 50), ("numTargetRowsDeleted", 10)],
                ),
            ],
        )
        .commit(
            2,
            &[commit_info(3000, "OPTIMIZE", &[("numCopiedRows", 5)])],
        );

    let histories = get_table_history(temp.path(), false, None).unwrap();
    assert_eq!(histories.len(), 1);
    let ops = &histories[0].operations;

    assert_eq!(
        totals(ops),
        vec![(2, 140, 1400), (1, 140, 1400), (0, 100, 1000)]
    );
    assert_eq!(ops[0].rows_copied, Some(5));
    assert_eq!(ops[0].rows_added, None);
    assert_eq!(ops[0].files_added, None);
    assert_eq!(ops[0].bytes_added, 0);
    assert_eq!(ops[1].rows_deleted, Some(10));
    assert_eq!(ops[1].files_removed, Some(1));
    assert_eq!(ops[2].operation.as_deref(), Some("WRITE"));
    assert_eq!(ops[2].timestamp, 1000);
}

#[rstest]
#[case::one(Some(1), vec![11])]
#[case::five(Some(5), vec![11, 10, 9, 8, 7])]
#[case::default_limit(Some(lakeview::DEFAULT_LIMIT), (2..12).rev().collect())]
#[case::more_than_available(Some(50), (0..12).rev().collect())]
#[case::unlimited(None, (0..12).rev().collect())]
fn test_limit_selects_most_recent(#[case] limit: Option<i64>, #[case] expected: Vec<u64>) {
    let temp = TempDir::new().unwrap();
    linear_table(temp.path(), 12);

    let histories = get_table_history(temp.path(), false, limit).unwrap();
    assert_eq!(versions(&histories[0].operations), expected);
    assert_eq!(histories[0].operations[0].total_rows, 120);
}

#[rstest]
#[case::zero(0)]
#[case::negative(-1)]
#[case::very_negative(i64::MIN)]
fn test_non_positive_limit_is_invalid(#[case] limit: i64) {
    let temp = TempDir::new().unwrap();
    linear_table(temp.path(), 3);

    let err = get_table_history(temp.path(), true, Some(limit)).unwrap_err();
    assert!(matches!(err, HistoryError::InvalidArgument(_)));
}

#[test]
fn test_empty_log_yields_empty_history() {
    let temp = TempDir::new().unwrap();
    TableFixture::create(temp.path());

    let histories = get_table_history(temp.path(), false, Some(10)).unwrap();
    assert_eq!(histories.len(), 1);
    assert!(histories[0].operations.is_empty());
    assert_eq!(histories[0].path, temp.path().display().to_string());
}

#[test]
fn test_directory_without_tables_yields_nothing() {
    let temp = TempDir::new().unwrap();
    let histories = get_table_history(temp.path(), true, Some(10)).unwrap();
    assert!(histories.is_empty());
}

#[test]
fn test_corrupt_commit_truncates_one_table_only() {
    let temp = TempDir::new().unwrap();
    let broken = linear_table(temp.path().join("broken"), 5);
    broken.commit_raw(3, "{\"add\": {\"path\": \"p\", \n");
    linear_table(temp.path().join("healthy"), 5);

    let request = HistoryRequest::new(temp.path()).recursive(true).limit(None);
    let report = collect_history(&LocalFileSystem, &request).unwrap();

    assert_eq!(report.tables.len(), 2);
    assert_eq!(versions(&report.tables[0].operations), vec![2, 1, 0]);
    assert_eq!(report.tables[1].operations.len(), 5);

    assert_eq!(report.diagnostics.len(), 1);
    match &report.diagnostics[0] {
        Diagnostic::TruncatedHistory { table, version, .. } => {
            assert!(table.ends_with("broken"));
            assert_eq!(*version, 3);
        }
        other => panic!("unexpected diagnostic {other:?}"),
    }
}

#[test]
fn test_checkpoint_gives_same_totals_as_full_replay() {
    let temp = TempDir::new().unwrap();
    let full = linear_table(temp.path().join("full"), 5);
    let cleaned = linear_table(temp.path().join("cleaned"), 5);

    let files: Vec<CheckpointAdd> = ["part-0.parquet", "part-1.parquet", "part-2.parquet"]
        .into_iter()
        .map(|path| CheckpointAdd {
            path,
            size: 100,
            rows: 10,
            modification_time: 1_700_000_000_000,
        })
        .collect();
    cleaned.checkpoint(2, &files);
    for version in 0..=2 {
        cleaned.delete_commit(version);
    }

    let request = HistoryRequest::new(temp.path()).recursive(true).limit(None);
    let report = collect_history(&LocalFileSystem, &request).unwrap();
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    let cleaned_ops = &report.tables[0].operations;
    let full_ops = &report.tables[1].operations;
    assert!(report.tables[0].path.ends_with("cleaned"));
    assert_eq!(full.root.display().to_string(), report.tables[1].path);

    assert_eq!(totals(cleaned_ops), vec![(4, 50, 500), (3, 40, 400)]);
    assert_eq!(totals(cleaned_ops)[..], totals(full_ops)[..2]);
}

#[test]
fn test_missing_baseline_is_reported() {
    let temp = TempDir::new().unwrap();
    let table = linear_table(temp.path(), 4);
    table.delete_commit(0);
    table.delete_commit(1);

    let request = HistoryRequest::new(temp.path()).limit(None);
    let report = collect_history(&LocalFileSystem, &request).unwrap();

    assert_eq!(totals(&report.tables[0].operations), vec![(3, 20, 200), (2, 10, 100)]);
    assert!(matches!(
        report.diagnostics.as_slice(),
        [Diagnostic::MissingBaseline { first_version: 2, .. }]
    ));
}

#[test]
fn test_serialized_rows_keep_absent_fields_null() {
    let temp = TempDir::new().unwrap();
    TableFixture::create(temp.path()).commit(
        0,
        &[commit_info(5, "SET TBLPROPERTIES", &[])],
    );

    let histories = get_table_history(temp.path(), false, None).unwrap();
    let rows = histories[0].rows();
    let row = &rows[0];

    assert!(row["rows_added"].is_null());
    assert!(row["files_added"].is_null());
    assert_eq!(row["bytes_added"], 0);
    assert_eq!(row["total_rows"], 0);
    assert_eq!(row["table_path"], temp.path().display().to_string());
}

#[test]
fn test_delta_rs_snake_case_metrics() {
    let temp = TempDir::new().unwrap();
    TableFixture::create(temp.path())
        .commit(
            0,
            &[
                add("part-0.parquet", 1000, 100),
                json!({ "commitInfo": {
                    "timestamp": 1000,
                    "operation": "WRITE",
                    "operationMetrics": {
                        "execution_time_ms": 12,
                        "num_added_files": 1,
                        "num_added_rows": 100,
                        "num_partitions": 0,
                        "num_removed_files": 0
                    }
                }}),
            ],
        )
        .commit(
            1,
            &[
                remove("part-0.parquet", 1000, 100),
                add("part-1.parquet", 900, 90),
                json!({ "commitInfo": {
                    "timestamp": 2000,
                    "operation": "DELETE",
                    "operationMetrics": {
                        "execution_time_ms": 5,
                        "num_added_files": 1,
                        "num_copied_rows": 90,
                        "num_deleted_rows": 10,
                        "num_removed_files": 1,
                        "rewrite_time_ms": 3,
                        "scan_time_ms": 1
                    }
                }}),
            ],
        );

    let histories = get_table_history(temp.path(), false, None).unwrap();
    let ops = &histories[0].operations;

    assert_eq!(ops[1].rows_added, Some(100));
    assert_eq!(ops[0].rows_added, None);
    assert_eq!(ops[0].rows_deleted, Some(10));
    assert_eq!(ops[0].rows_copied, Some(90));
    assert_eq!(totals(ops), vec![(1, 90, 900), (0, 100, 1000)]);
}

#[test]
fn test_overflowing_totals_only_affect_their_table() {
    let temp = TempDir::new().unwrap();
    let huge = commit_info(1, "WRITE", &[("numAddedRows", i64::MAX as u64)]);
    TableFixture::create(temp.path().join("huge"))
        .commit(0, &[huge.clone()])
        .commit(1, &[huge]);
    linear_table(temp.path().join("normal"), 3);

    let request = HistoryRequest::new(temp.path()).recursive(true).limit(None);
    let report = collect_history(&LocalFileSystem, &request).unwrap();

    assert_eq!(report.tables.len(), 2);
    assert!(report.tables[0].operations.is_empty());
    assert_eq!(report.tables[1].operations.len(), 3);
    assert!(matches!(
        report.diagnostics.as_slice(),
        [Diagnostic::InconsistentLog { table, .. }] if table.ends_with("huge")
    ));
}
