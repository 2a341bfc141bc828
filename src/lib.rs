//! # lakeview
//!
//! A library and command-line tool for inspecting the history of Delta Lake
//! tables straight from their transaction logs.
//!
//! ## Overview
//!
//! A Delta table keeps an append-only log of JSON commits under
//! `<table>/_delta_log/`. `lakeview` finds tables under a path, reads each
//! table's log in version order and reports, for every version, what the
//! commit changed (files, rows and bytes added or removed) together with the
//! table's running row and byte totals. Results are returned most recent
//! version first.
//!
//! ```no_run
//! let histories = lakeview::get_table_history("/data/lake", true, Some(10))?;
//! for table in &histories {
//!     for op in &table.operations {
//!         println!("{} v{}: {} rows", table.path, op.version, op.total_rows);
//!     }
//! }
//! # Ok::<(), lakeview::HistoryError>(())
//! ```
//!
//! ## Architecture
//!
//! - Storage access ([`fs`])
//! - Log layout, decoding and reading ([`delta`])
//! - Table discovery ([`discovery`], [`filter`])
//! - Aggregation and collection across tables ([`history`], [`cancel`])
//! - Current-state summaries ([`summary`])
//! - Output, configuration and the command line ([`report`], [`config`],
//!   [`logger`], [`handlers`])

/// Cancellation shared between a caller and an in-flight collection.
pub mod cancel;

/// Platform-agnostic configuration directory and persistent settings.
///
/// Locates `config.toml` following platform conventions (XDG on Linux,
/// Application Support on macOS, AppData on Windows) and holds the defaults
/// the command line falls back to.
pub mod config;

/// Transaction log layout and decoding.
///
/// Recognizes commit and checkpoint file names, decodes commit actions into a
/// fixed entry shape, reads checkpoint parquet files and reads one table's log
/// in version order.
pub mod delta;

/// Table discovery under a root path, with cycle-safe recursion.
pub mod discovery;

/// Error types for storage access and history collection.
pub mod error;

/// Directory exclusion patterns for recursive discovery.
pub mod filter;

/// Read-only storage interface and its local filesystem implementation.
pub mod fs;

/// Command handlers behind the `lakeview` binary.
pub mod handlers;

/// Per-version operation records, running totals and the collection of
/// history across tables.
///
/// Tables are read in parallel; within a table, versions are folded strictly
/// in order by an accumulator owned by that table's task.
pub mod history;

/// Logging configuration.
///
/// Console logging via `env_logger`, controlled by `RUST_LOG` or `--verbose`.
pub mod logger;

/// Diagnostics and output rendering (console tables, JSON).
pub mod report;

/// Current-state summaries: active files, rows, size and file size
/// distribution of each table.
pub mod summary;

pub use cancel::CancellationToken;
pub use discovery::discover;
pub use error::{FsError, HistoryError};
pub use history::{
    collect_history, get_table_history, HistoryRequest, OperationRecord, TableHistory,
    DEFAULT_LIMIT,
};
pub use report::{Diagnostic, HistoryReport};
pub use summary::{summarize_tables, SummaryOptions, TableSummary};
