//! Command handler modules
//!
//! This module contains the command handler functions called from main.rs,
//! organized by command.

pub mod config;
pub mod history;
pub mod summary;

// Re-export all public handler functions for convenient use
pub use config::{handle_config_show, handle_config_update, ConfigUpdate};
pub use history::{handle_history, HistoryArgs, HistoryFormat};
pub use summary::{handle_summary, SummaryFormat};
