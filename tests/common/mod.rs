//! Fixtures for building Delta tables on disk.

#![allow(dead_code)]

use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;
use serde_json::{json, Map, Value};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const LOG_DIR: &str = "_delta_log";

/// A table directory with a `_delta_log` subdirectory.
pub struct TableFixture {
    pub root: PathBuf,
}

impl TableFixture {
    pub fn create(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(LOG_DIR)).unwrap();
        Self { root }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR)
    }

    pub fn commit_path(&self, version: u64) -> PathBuf {
        self.log_dir().join(format!("{version:020}.json"))
    }

    /// Write a commit made of the given action lines.
    pub fn commit(&self, version: u64, actions: &[Value]) -> &Self {
        let body: Vec<String> = actions.iter().map(Value::to_string).collect();
        fs::write(self.commit_path(version), body.join("\n") + "\n").unwrap();
        self
    }

    pub fn commit_raw(&self, version: u64, body: &str) -> &Self {
        fs::write(self.commit_path(version), body).unwrap();
        self
    }

    pub fn delete_commit(&self, version: u64) {
        fs::remove_file(self.commit_path(version)).unwrap();
    }

    /// Write a single-part checkpoint listing `files` as the active files.
    pub fn checkpoint(&self, version: u64, files: &[CheckpointAdd]) -> &Self {
        let path = self
            .log_dir()
            .join(format!("{version:020}.checkpoint.parquet"));
        write_checkpoint(&path, files);
        self
    }

    /// Point `_last_checkpoint` at `version`.
    pub fn last_checkpoint(&self, version: u64) -> &Self {
        let hint = json!({ "version": version, "size": 0 });
        fs::write(self.log_dir().join("_last_checkpoint"), hint.to_string()).unwrap();
        self
    }
}

/// An active file recorded in a checkpoint.
pub struct CheckpointAdd {
    pub path: &'static str,
    pub size: i64,
    pub rows: u64,
    pub modification_time: i64,
}

fn write_checkpoint(path: &Path, files: &[CheckpointAdd]) {
    let schema = parse_message_type(
        "message checkpoint {
            optional group add {
                optional binary path (UTF8);
                optional int64 size;
                optional int64 modificationTime;
                optional binary stats (UTF8);
            }
        }",
    )
    .unwrap();

    let props = WriterProperties::builder().build();
    let file = File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, Arc::new(schema), Arc::new(props)).unwrap();

    let def_levels = vec![2i16; files.len()];
    let mut row_group_writer = writer.next_row_group().unwrap();
    let mut column = 0;
    while let Some(mut col_writer) = row_group_writer.next_column().unwrap() {
        match (column, col_writer.untyped()) {
            (0, ColumnWriter::ByteArrayColumnWriter(typed)) => {
                let values: Vec<ByteArray> = files.iter().map(|f| ByteArray::from(f.path)).collect();
                typed.write_batch(&values, Some(&def_levels), None).unwrap();
            }
            (1, ColumnWriter::Int64ColumnWriter(typed)) => {
                let values: Vec<i64> = files.iter().map(|f| f.size).collect();
                typed.write_batch(&values, Some(&def_levels), None).unwrap();
            }
            (2, ColumnWriter::Int64ColumnWriter(typed)) => {
                let values: Vec<i64> = files.iter().map(|f| f.modification_time).collect();
                typed.write_batch(&values, Some(&def_levels), None).unwrap();
            }
            (3, ColumnWriter::ByteArrayColumnWriter(typed)) => {
                let values: Vec<ByteArray> = files
                    .iter()
                    .map(|f| ByteArray::from(json!({ "numRecords": f.rows }).to_string().as_str()))
                    .collect();
                typed.write_batch(&values, Some(&def_levels), None).unwrap();
            }
            _ => panic!("unexpected checkpoint column {column}"),
        }
        col_writer.close().unwrap();
        column += 1;
    }
    row_group_writer.close().unwrap();
    writer.close().unwrap();
}

/// `add` action with a `numRecords` statistic.
pub fn add(path: &str, size: u64, rows: u64) -> Value {
    json!({
        "add": {
            "path": path,
            "partitionValues": {},
            "size": size,
            "modificationTime": 1_700_000_000_000i64,
            "dataChange": true,
            "stats": json!({ "numRecords": rows }).to_string(),
        }
    })
}

/// `remove` action with a `numRecords` statistic.
pub fn remove(path: &str, size: u64, rows: u64) -> Value {
    json!({
        "remove": {
            "path": path,
            "size": size,
            "deletionTimestamp": 1_700_000_000_000i64,
            "dataChange": true,
            "stats": json!({ "numRecords": rows }).to_string(),
        }
    })
}

/// `commitInfo` action; `metrics` are written as strings the way Spark does.
pub fn commit_info(timestamp: i64, operation: &str, metrics: &[(&str, u64)]) -> Value {
    let mut operation_metrics = Map::new();
    for (key, value) in metrics {
        operation_metrics.insert(key.to_string(), Value::String(value.to_string()));
    }
    json!({
        "commitInfo": {
            "timestamp": timestamp,
            "operation": operation,
            "operationMetrics": operation_metrics,
        }
    })
}

pub fn protocol() -> Value {
    json!({ "protocol": { "minReaderVersion": 1, "minWriterVersion": 2 } })
}

/// A table whose every version adds one 100-byte file of 10 rows.
pub fn linear_table(root: impl AsRef<Path>, versions: u64) -> TableFixture {
    let table = TableFixture::create(root);
    for version in 0..versions {
        table.commit(
            version,
            &[
                add(&format!("part-{version}.parquet"), 100, 10),
                commit_info(1_700_000_000_000 + version as i64, "WRITE", &[]),
            ],
        );
    }
    table
}
