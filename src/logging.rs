//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for results and JSON output.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "STORYCTX_LOG";

/// Build the filter: `STORYCTX_LOG` first, then the configured level.
///
/// An unparsable directive falls back to `warn`.
pub fn build_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return filter;
    }

    let level = if verbose { "debug" } else { config.level.as_str() };
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Initialize the global subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = build_filter(config, verbose);

    let result = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }
}
