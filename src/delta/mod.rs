//! Transaction log access.
//!
//! Everything that knows the on-disk layout of `_delta_log/` lives here: file
//! naming, action decoding, checkpoint decoding and the per-table reader. The
//! rest of the crate only sees [`LogEntry`] values and [`CheckpointState`]s.

pub mod actions;
pub mod checkpoint;
pub mod entry;
pub mod naming;
pub mod reader;

pub use actions::{parse_commit, Action, AddFile, CommitInfo, RemoveFile};
pub use checkpoint::{ActiveFile, CheckpointFiles, CheckpointState, LastCheckpoint};
pub use entry::LogEntry;
pub use naming::{LogFileName, LAST_CHECKPOINT_FILE_NAME, LOG_DIR_NAME};
pub use reader::{LogListing, LogReader, LogSegment};
