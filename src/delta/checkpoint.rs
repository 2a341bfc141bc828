//! Checkpoint decoding.
//!
//! A checkpoint is a parquet snapshot of the table state at one version, split
//! over one or more part files. Only the live `add` rows are read; they give
//! the set of active files, from which row and byte totals follow. Checkpoints
//! are treated as a cache: the reader only consults one when the commit files
//! needed to replay from version 0 are gone.

use std::collections::BTreeMap;
use std::path::Path;

use bytes::Bytes;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use serde::Deserialize;

use super::actions::{stats_num_records, AddFile};
use super::naming::LAST_CHECKPOINT_FILE_NAME;
use crate::error::{HistoryError, Result};
use crate::fs::FileSystem;

/// Contents of `_last_checkpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastCheckpoint {
    pub version: u64,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub size_in_bytes: Option<u64>,
    #[serde(default)]
    pub num_of_add_files: Option<u64>,
    #[serde(default)]
    pub parts: Option<u32>,
}

/// Read the checkpoint hint. A missing or unparsable hint is `None`.
pub fn read_last_checkpoint(fs: &dyn FileSystem, log_dir: &Path) -> Result<Option<LastCheckpoint>> {
    let path = log_dir.join(LAST_CHECKPOINT_FILE_NAME);
    let contents = match fs.read_file(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(source) => return Err(HistoryError::Io { path, source }),
    };

    match serde_json::from_slice::<LastCheckpoint>(&contents) {
        Ok(hint) => Ok(Some(hint)),
        Err(e) => {
            log::warn!("Ignoring unreadable {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// A data file that is part of the table at some version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFile {
    pub size: u64,
    pub num_records: Option<u64>,
    pub modification_time: i64,
}

impl From<&AddFile> for ActiveFile {
    fn from(add: &AddFile) -> Self {
        Self {
            size: add.size,
            num_records: add.num_records(),
            modification_time: add.modification_time,
        }
    }
}

/// Table state recorded by a checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointState {
    pub version: u64,
    /// Active files keyed by path.
    pub files: BTreeMap<String, ActiveFile>,
}

impl CheckpointState {
    /// Sum of the files' record counts; `None` on overflow.
    pub fn total_rows(&self) -> Option<i64> {
        checked_total(self.files.values().map(|f| f.num_records.unwrap_or(0)))
    }

    pub fn total_bytes(&self) -> Option<i64> {
        checked_total(self.files.values().map(|f| f.size))
    }
}

fn checked_total(mut values: impl Iterator<Item = u64>) -> Option<i64> {
    values.try_fold(0i64, |sum, v| sum.checked_add(i64::try_from(v).ok()?))
}

/// The part files of one checkpoint version found in a log listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointFiles {
    pub version: u64,
    single: Option<String>,
    parts: BTreeMap<u32, String>,
    expected_parts: Option<u32>,
}

impl CheckpointFiles {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    pub fn add_file(&mut self, name: &str, part: Option<(u32, u32)>) {
        match part {
            None => self.single = Some(name.to_string()),
            Some((part, of)) => {
                // parts written by different attempts may disagree on the count
                if self.expected_parts.is_some_and(|expected| expected != of) {
                    return;
                }
                self.expected_parts = Some(of);
                self.parts.insert(part, name.to_string());
            }
        }
    }

    /// File names to read, or `None` when a multi-part checkpoint is incomplete.
    pub fn file_names(&self) -> Option<Vec<&str>> {
        if let Some(single) = &self.single {
            return Some(vec![single.as_str()]);
        }
        let expected = self.expected_parts?;
        if self.parts.len() as u32 != expected {
            return None;
        }
        Some(self.parts.values().map(String::as_str).collect())
    }

    pub fn is_complete(&self) -> bool {
        self.file_names().is_some()
    }
}

/// Read every part of a checkpoint and collect its active files.
pub fn read_checkpoint(
    fs: &dyn FileSystem,
    log_dir: &Path,
    files: &CheckpointFiles,
) -> Result<CheckpointState> {
    let version = files.version;
    let names = files.file_names().ok_or_else(|| HistoryError::Checkpoint {
        version,
        reason: "checkpoint is missing parts".to_string(),
    })?;

    let mut state = CheckpointState {
        version,
        files: BTreeMap::new(),
    };

    for name in names {
        let path = log_dir.join(name);
        let data = fs
            .read_file(&path)
            .map_err(|source| HistoryError::Io { path, source })?;
        decode_part(version, data, &mut state.files)?;
    }

    log::debug!(
        "Checkpoint {} lists {} active files",
        version,
        state.files.len()
    );

    Ok(state)
}

fn decode_part(
    version: u64,
    data: Vec<u8>,
    files: &mut BTreeMap<String, ActiveFile>,
) -> Result<()> {
    let to_err = |e: parquet::errors::ParquetError| HistoryError::Checkpoint {
        version,
        reason: e.to_string(),
    };

    let reader = SerializedFileReader::new(Bytes::from(data)).map_err(to_err)?;
    let rows = reader.get_row_iter(None).map_err(to_err)?;

    for row in rows {
        let row = row.map_err(to_err)?;
        if let Some(Field::Group(add)) = column(&row, "add") {
            if let Some((path, file)) = active_file(add) {
                files.insert(path, file);
            }
        }
    }

    Ok(())
}

fn column<'a>(row: &'a Row, name: &str) -> Option<&'a Field> {
    row.get_column_iter()
        .find(|(column, _)| column.as_str() == name)
        .map(|(_, field)| field)
}

fn as_i64(field: &Field) -> Option<i64> {
    match field {
        Field::Long(v) => Some(*v),
        Field::Int(v) => Some(i64::from(*v)),
        Field::TimestampMillis(v) => Some(*v),
        _ => None,
    }
}

fn as_str(field: &Field) -> Option<&str> {
    match field {
        Field::Str(s) => Some(s.as_str()),
        _ => None,
    }
}

fn active_file(add: &Row) -> Option<(String, ActiveFile)> {
    let path = column(add, "path").and_then(as_str)?.to_string();
    let size = column(add, "size").and_then(as_i64).unwrap_or(0).max(0) as u64;
    let modification_time = column(add, "modificationTime")
        .and_then(as_i64)
        .unwrap_or(0);
    let num_records = stats_num_records(column(add, "stats").and_then(as_str));

    Some((
        path,
        ActiveFile {
            size,
            num_records,
            modification_time,
        },
    ))
}
