use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::history::TableHistory;
use crate::summary::TableSummary;

/// A recoverable problem met while collecting history.
///
/// Diagnostics travel next to the result instead of failing the call: the
/// affected directory or table is skipped or shortened and every other table
/// is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A directory could not be listed during discovery
    UnreadableDirectory { path: String, reason: String },

    /// History stops before `version`; only older versions are reported
    TruncatedHistory {
        table: String,
        version: u64,
        reason: String,
    },

    /// The log starts after version 0 and no checkpoint gives the earlier
    /// state, so totals only cover the retained versions
    MissingBaseline { table: String, first_version: u64 },

    CheckpointUnreadable {
        table: String,
        version: u64,
        reason: String,
    },

    /// The log directory of a table could not be listed
    UnreadableLog { table: String, reason: String },

    /// Versions reached aggregation out of order; the table has no history
    InconsistentLog { table: String, reason: String },
}

impl Diagnostic {
    /// Table or directory the diagnostic refers to.
    pub fn subject(&self) -> &str {
        match self {
            Diagnostic::UnreadableDirectory { path, .. } => path,
            Diagnostic::TruncatedHistory { table, .. }
            | Diagnostic::MissingBaseline { table, .. }
            | Diagnostic::CheckpointUnreadable { table, .. }
            | Diagnostic::UnreadableLog { table, .. }
            | Diagnostic::InconsistentLog { table, .. } => table,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnreadableDirectory { path, reason } => {
                write!(f, "skipped unreadable directory {path}: {reason}")
            }
            Diagnostic::TruncatedHistory {
                table,
                version,
                reason,
            } => write!(f, "{table}: history truncated before version {version}: {reason}"),
            Diagnostic::MissingBaseline {
                table,
                first_version,
            } => write!(
                f,
                "{table}: log starts at version {first_version}, totals exclude earlier versions"
            ),
            Diagnostic::CheckpointUnreadable {
                table,
                version,
                reason,
            } => write!(f, "{table}: checkpoint {version} unreadable: {reason}"),
            Diagnostic::UnreadableLog { table, reason } => {
                write!(f, "{table}: log unreadable: {reason}")
            }
            Diagnostic::InconsistentLog { table, reason } => write!(f, "{table}: {reason}"),
        }
    }
}

/// Result of one history collection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryReport {
    pub tables: Vec<TableHistory>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,

    /// Tables discovered before pagination
    pub total_tables: usize,
}

impl HistoryReport {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Generate a JSON report
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize history to JSON")
    }

    /// Every operation of every table as one flat JSON array.
    pub fn to_rows_json(&self) -> Result<String> {
        let rows: Vec<Value> = self
            .tables
            .iter()
            .flat_map(TableHistory::rows)
            .map(Value::Object)
            .collect();
        serde_json::to_string_pretty(&rows).context("Failed to serialize history rows to JSON")
    }

    /// Print one table per history, most recent version first.
    pub fn print_summary(&self) {
        for (i, history) in self.tables.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_history(history);
        }
        print_diagnostics(&self.diagnostics);
    }
}

fn print_history(history: &TableHistory) {
    println!("{}", history.path.bold().cyan());

    if history.is_empty() {
        println!("  {}", "No commits".yellow());
        return;
    }

    println!(
        "{}",
        format!(
            "{:>7} | {:<23} | {:<12} | {:>10} | {:>12} | {:>12} | {:>12}",
            "version", "timestamp", "operation", "rows_added", "rows_deleted", "total_rows", "total_size"
        )
        .bold()
    );
    println!(
        "{}",
        "--------|-------------------------|--------------|------------|--------------|--------------|-------------"
    );

    for op in &history.operations {
        println!(
            "{:>7} | {:<23} | {:<12} | {:>10} | {:>12} | {:>12} | {:>12}",
            op.version,
            format_timestamp(op.timestamp),
            op.operation.as_deref().unwrap_or("-"),
            format_optional(op.rows_added),
            format_optional(op.rows_deleted),
            format_number(op.total_rows),
            format_bytes(op.total_bytes.max(0) as u64)
        );
    }
}

/// Print table summaries.
pub fn print_summaries(summaries: &[TableSummary]) {
    for summary in summaries {
        let modified = if summary.last_modified > 0 {
            format!(" | {}", format_timestamp(summary.last_modified))
        } else {
            String::new()
        };
        println!(
            "{} v{}{}",
            summary.path.bold().cyan(),
            summary.version,
            modified
        );
        println!(
            "  {} files, {} rows, {}",
            format_number(summary.num_files as i64),
            format_number(summary.total_rows),
            format_bytes(summary.total_size)
        );
        if let Some(stats) = &summary.file_size_stats {
            println!(
                "  {} {}, {} {}, {} {}, {} {}, {} {}, {} {}",
                "min:".bold(),
                format_bytes(stats.min),
                "p25:".bold(),
                format_bytes(stats.p25),
                "median:".bold(),
                format_bytes(stats.median),
                "p75:".bold(),
                format_bytes(stats.p75),
                "max:".bold(),
                format_bytes(stats.max),
                "mean:".bold(),
                format_bytes(stats.mean as u64)
            );
        }
        println!();
    }
}

/// Print diagnostics as warnings on stderr.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    eprintln!();
    for diagnostic in diagnostics {
        eprintln!("{} {}", "warning:".yellow().bold(), diagnostic);
    }
}

fn format_optional(value: Option<u64>) -> String {
    value
        .map(|n| format_number(n as i64))
        .unwrap_or_default()
}

/// Human-readable size with binary units.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Integer with thousands separators.
pub fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Epoch milliseconds as a UTC date-time.
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => millis.to_string(),
    }
}
