//! Summary command handler

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use std::path::Path;

use crate::config::LakeviewConfig;
use crate::fs::LocalFileSystem;
use crate::report::print_summaries;
use crate::summary::{summarize_tables, SummaryOptions};

/// Output format of the `summary` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Table,
    Json,
}

/// Handle the `summary` command
pub fn handle_summary(path: &Path, recursive: bool, format: SummaryFormat) -> Result<()> {
    let config = LakeviewConfig::load().context("Failed to load configuration")?;
    let options = SummaryOptions {
        use_checkpoints: config.use_checkpoints,
        workers: config.workers,
        filter: config.discovery,
    };

    let summaries = summarize_tables(&LocalFileSystem, path, recursive, &options)
        .with_context(|| format!("Failed to summarize tables under {}", path.display()))?;

    match format {
        SummaryFormat::Json => {
            let json = serde_json::to_string_pretty(&summaries)
                .context("Failed to serialize summaries to JSON")?;
            println!("{json}");
        }
        SummaryFormat::Table => {
            if summaries.is_empty() {
                eprintln!(
                    "{}",
                    format!("No Delta tables found in {}", path.display()).yellow()
                );
                return Ok(());
            }
            print_summaries(&summaries);
        }
    }

    Ok(())
}
