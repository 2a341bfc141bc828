//! Recognition of the file names found in a `_delta_log` directory.
//!
//! Layout:
//!   <root>/_delta_log/00000000000000000000.json
//!   <root>/_delta_log/00000000000000000010.checkpoint.parquet
//!   <root>/_delta_log/00000000000000000020.checkpoint.0000000001.0000000002.parquet
//!   <root>/_delta_log/_last_checkpoint
//!
//! Versions are taken from names only; file contents are never consulted to
//! order the log.

/// Name of the log subdirectory under a table root.
pub const LOG_DIR_NAME: &str = "_delta_log";
/// Name of the checkpoint hint file.
pub const LAST_CHECKPOINT_FILE_NAME: &str = "_last_checkpoint";
/// Number of digits in a zero-padded version.
pub const VERSION_DIGITS: usize = 20;
/// Number of digits in multi-part checkpoint part numbers.
const PART_DIGITS: usize = 10;

/// A recognized log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFileName {
    Commit {
        version: u64,
    },
    Checkpoint {
        version: u64,
        /// `(part, of)` for multi-part checkpoints.
        part: Option<(u32, u32)>,
    },
    LastCheckpoint,
}

impl LogFileName {
    /// Classify a directory entry name, `None` for anything unrecognized
    /// (`.crc` files, temp files, `_commits/`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        if name == LAST_CHECKPOINT_FILE_NAME {
            return Some(LogFileName::LastCheckpoint);
        }

        let (version, rest) = split_version(name)?;

        if rest == ".json" {
            return Some(LogFileName::Commit { version });
        }

        let rest = rest.strip_prefix(".checkpoint.")?;
        if rest == "parquet" {
            return Some(LogFileName::Checkpoint {
                version,
                part: None,
            });
        }

        let rest = rest.strip_suffix(".parquet")?;
        let (part, of) = rest.split_once('.')?;
        let part = parse_digits(part, PART_DIGITS)?;
        let of = parse_digits(of, PART_DIGITS)?;
        if part == 0 || part > of {
            return None;
        }

        Some(LogFileName::Checkpoint {
            version,
            part: Some((part as u32, of as u32)),
        })
    }

    pub fn commit_version(&self) -> Option<u64> {
        match self {
            LogFileName::Commit { version } => Some(*version),
            _ => None,
        }
    }
}

/// File name of the commit for `version`.
pub fn commit_file_name(version: u64) -> String {
    format!("{version:0width$}.json", width = VERSION_DIGITS)
}

/// Whether `name` is a commit file name.
pub fn is_commit_file(name: &str) -> bool {
    matches!(LogFileName::parse(name), Some(LogFileName::Commit { .. }))
}

fn split_version(name: &str) -> Option<(u64, &str)> {
    if name.len() <= VERSION_DIGITS || !name.is_char_boundary(VERSION_DIGITS) {
        return None;
    }
    let (digits, rest) = name.split_at(VERSION_DIGITS);
    let version = parse_digits(digits, VERSION_DIGITS)?;
    Some((version, rest))
}

fn parse_digits(s: &str, width: usize) -> Option<u64> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
