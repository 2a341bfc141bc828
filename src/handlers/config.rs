//! Configuration command handlers
//!
//! Updates and displays the persistent settings in `config.toml`.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::{ConfigManager, LakeviewConfig};
use crate::filter::DiscoveryFilter;

/// Settings given on the command line; `None` leaves a setting unchanged.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub default_limit: Option<i64>,
    pub workers: Option<usize>,
    pub use_checkpoints: Option<bool>,
    /// Comma-separated patterns; an empty string clears the list
    pub exclude: Option<String>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.default_limit.is_none()
            && self.workers.is_none()
            && self.use_checkpoints.is_none()
            && self.exclude.is_none()
    }

    /// Apply to `config`, returning a line per changed setting.
    pub fn apply(&self, config: &mut LakeviewConfig) -> Vec<String> {
        let mut changes = Vec::new();

        if let Some(limit) = self.default_limit {
            config.default_limit = limit;
            changes.push(format!("Set default_limit to {limit}"));
        }

        if let Some(workers) = self.workers {
            config.workers = Some(workers);
            changes.push(format!("Set workers to {workers}"));
        }

        if let Some(enabled) = self.use_checkpoints {
            config.use_checkpoints = enabled;
            changes.push(format!("Set use_checkpoints to {enabled}"));
        }

        if let Some(excludes) = &self.exclude {
            config.discovery = DiscoveryFilter::from_list(excludes);
            if config.discovery.is_empty() {
                changes.push("Cleared exclude patterns".to_string());
            } else {
                changes.push(format!(
                    "Set exclude patterns: {:?}",
                    config.discovery.exclude_patterns
                ));
            }
        }

        changes
    }
}

/// Handle `config` with one or more settings to change
pub fn handle_config_update(update: &ConfigUpdate) -> Result<()> {
    if update.is_empty() {
        return handle_config_show();
    }

    let mut config = LakeviewConfig::load().context("Failed to load current configuration")?;
    let changes = update.apply(&mut config);
    config.save().context("Failed to save configuration")?;

    for change in changes {
        println!("  {} {}", "✓".green(), change);
    }
    println!("{}", "Configuration saved successfully!".green().bold());

    Ok(())
}

/// Handle `config --show`
pub fn handle_config_show() -> Result<()> {
    let config = LakeviewConfig::load()?;

    println!("{}", "Current Configuration:".bold());
    println!(
        "  {}: {}",
        "File".cyan(),
        ConfigManager::config_file_path()?.display()
    );
    display_config_summary(&config);

    Ok(())
}

fn display_config_summary(config: &LakeviewConfig) {
    println!("  {}: {}", "Default limit".cyan(), config.default_limit);
    println!(
        "  {}: {}",
        "Workers".cyan(),
        config
            .workers
            .map(|w| w.to_string())
            .unwrap_or_else(|| "One per CPU".to_string())
    );
    println!(
        "  {}: {}",
        "Use checkpoints".cyan(),
        if config.use_checkpoints {
            "Yes".green()
        } else {
            "No (totals start at the oldest retained commit)".yellow()
        }
    );
    println!(
        "  {}: {}",
        "Exclude patterns".cyan(),
        if config.discovery.is_empty() {
            "None".to_string()
        } else {
            config.discovery.exclude_patterns.join(", ")
        }
    );
}
