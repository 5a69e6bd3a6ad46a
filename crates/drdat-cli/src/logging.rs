//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Logs go to stderr so that `--stdout` output stays clean JSON. `RUST_LOG`
//! overrides the level chosen on the command line.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Map the `-v` count to a log level.
///
/// - 0: warn
/// - 1 (`-v`): info
/// - 2 (`-vv`): debug
/// - 3+ (`-vvv`): trace
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logging(verbosity: u8) {
    let filter = build_env_filter(level_from_verbosity(verbosity));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Our crates follow the CLI level; everything else stays at warn.
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!("warn,drdat={level},drdat_core={level}"))
    })
}
