//! History command handler
//!
//! Resolves the command-line options against the saved configuration, runs
//! the history collection and renders the result.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::LakeviewConfig;
use crate::fs::LocalFileSystem;
use crate::history::{collect_history, HistoryRequest};
use crate::report::print_diagnostics;

/// Output format of the `history` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HistoryFormat {
    /// Colored table per table
    Table,
    /// Report object with tables and diagnostics
    Json,
    /// One flat JSON row per operation, tagged with its table path
    Rows,
}

/// Options of the `history` command
#[derive(Debug, Clone)]
pub struct HistoryArgs {
    pub path: PathBuf,
    pub recursive: bool,
    pub limit: Option<i64>,
    pub all: bool,
    pub format: HistoryFormat,
    pub page_size: Option<usize>,
    pub page: Option<usize>,
}

/// Build the request from command-line options and saved settings.
pub fn build_request(args: &HistoryArgs, config: &LakeviewConfig) -> Result<HistoryRequest> {
    let limit = if args.all {
        None
    } else {
        Some(args.limit.unwrap_or(config.default_limit))
    };

    let mut request = HistoryRequest::new(&args.path)
        .recursive(args.recursive)
        .limit(limit)
        .workers(config.workers)
        .use_checkpoints(config.use_checkpoints)
        .filter(config.discovery.clone());

    match (args.page_size, args.page) {
        (Some(size), page) => request = request.page(size, page.unwrap_or(1)),
        (None, Some(_)) => anyhow::bail!("--page requires --page-size"),
        (None, None) => {}
    }

    Ok(request)
}

/// Handle the `history` command
pub fn handle_history(args: &HistoryArgs) -> Result<()> {
    let config = LakeviewConfig::load().context("Failed to load configuration")?;
    let request = build_request(args, &config)?;

    let report = collect_history(&LocalFileSystem, &request)
        .with_context(|| format!("Failed to read history under {}", args.path.display()))?;

    match args.format {
        HistoryFormat::Json => println!("{}", report.to_json()?),
        HistoryFormat::Rows => {
            println!("{}", report.to_rows_json()?);
            print_diagnostics(&report.diagnostics);
        }
        HistoryFormat::Table => {
            if report.is_empty() {
                eprintln!(
                    "{}",
                    format!("No Delta tables found in {}", args.path.display()).yellow()
                );
                print_diagnostics(&report.diagnostics);
                return Ok(());
            }
            report.print_summary();
            if report.tables.len() < report.total_tables {
                println!(
                    "\n{} Showing {} of {} tables",
                    "Note:".yellow(),
                    report.tables.len(),
                    report.total_tables
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> HistoryArgs {
        HistoryArgs {
            path: PathBuf::from("/lake"),
            recursive: true,
            limit: None,
            all: false,
            format: HistoryFormat::Table,
            page_size: None,
            page: None,
        }
    }

    #[test]
    fn test_limit_falls_back_to_config() {
        let config = LakeviewConfig {
            default_limit: 3,
            ..Default::default()
        };
        let request = build_request(&args(), &config).unwrap();
        assert_eq!(request.limit, Some(3));
        assert!(request.recursive);
    }

    #[test]
    fn test_all_disables_limit() {
        let request = build_request(
            &HistoryArgs {
                all: true,
                limit: Some(5),
                ..args()
            },
            &LakeviewConfig::default(),
        )
        .unwrap();
        assert_eq!(request.limit, None);
    }

    #[test]
    fn test_page_requires_page_size() {
        let result = build_request(
            &HistoryArgs {
                page: Some(2),
                ..args()
            },
            &LakeviewConfig::default(),
        );
        assert!(result.is_err());

        let request = build_request(
            &HistoryArgs {
                page_size: Some(10),
                ..args()
            },
            &LakeviewConfig::default(),
        )
        .unwrap();
        assert_eq!(request.page.map(|p| (p.size, p.number)), Some((10, 1)));
    }
}
