use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lakeview::handlers::{
    self, ConfigUpdate, HistoryArgs, HistoryFormat, SummaryFormat,
};
use lakeview::logger;

#[derive(Parser)]
#[command(name = "lakeview")]
#[command(about = "Inspect the version history of Delta Lake tables", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show per-version history with running row and size totals
    History {
        /// Table root, its _delta_log directory, or a directory containing tables
        path: PathBuf,

        /// Search subdirectories for tables
        #[arg(short, long)]
        recursive: bool,

        /// Most recent versions to show per table (default from config)
        #[arg(short, long, conflicts_with = "all")]
        limit: Option<i64>,

        /// Show every version
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = HistoryFormat::Table)]
        format: HistoryFormat,

        /// Tables per page
        #[arg(long)]
        page_size: Option<usize>,

        /// Page number, starting at 1
        #[arg(long)]
        page: Option<usize>,
    },

    /// Summarize the current files, rows and size of each table
    Summary {
        path: PathBuf,

        /// Search subdirectories for tables
        #[arg(short, long)]
        recursive: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = SummaryFormat::Table)]
        format: SummaryFormat,
    },

    /// Configure default settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Versions shown per table when --limit is not given
        #[arg(long)]
        default_limit: Option<i64>,

        /// Worker threads for reading tables
        #[arg(long)]
        workers: Option<usize>,

        /// Use checkpoints when older commits have been cleaned up
        #[arg(long)]
        use_checkpoints: Option<bool>,

        /// Skip directories matching these patterns during recursive discovery
        /// (comma-separated, empty to clear)
        #[arg(long)]
        exclude: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::History {
            path,
            recursive,
            limit,
            all,
            format,
            page_size,
            page,
        } => {
            handlers::handle_history(&HistoryArgs {
                path,
                recursive,
                limit,
                all,
                format,
                page_size,
                page,
            })?;
        }
        Commands::Summary {
            path,
            recursive,
            format,
        } => {
            handlers::handle_summary(&path, recursive, format)?;
        }
        Commands::Config {
            show,
            default_limit,
            workers,
            use_checkpoints,
            exclude,
        } => {
            if show {
                handlers::handle_config_show()?;
            } else {
                handlers::handle_config_update(&ConfigUpdate {
                    default_limit,
                    workers,
                    use_checkpoints,
                    exclude,
                })?;
            }
        }
    }

    Ok(())
}
