use log::LevelFilter;
use std::io::Write;

/// Level used when `RUST_LOG` is unset.
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Initialize the logging system
///
/// Logs go to stderr so that `--format json` output on stdout stays
/// machine-readable. The level can be controlled via `RUST_LOG`:
/// - `RUST_LOG=error` - Only errors
/// - `RUST_LOG=warn` - Warnings and errors (default)
/// - `RUST_LOG=debug` - Discovery and per-table progress
/// - `RUST_LOG=trace` - Everything
///
/// `--verbose` raises the default to debug.
///
/// ```bash
/// RUST_LOG=debug lakeview history ./lake --recursive
/// ```
pub fn init_logger(verbose: bool) {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or_else(|| default_level(verbose));

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // Ignore error if logger is already initialized
}
