//! Diagnostic tracing setup.
//!
//! Console progress is plain `println!`. Tracing carries the detail that is
//! only useful when something goes wrong (every external command and its
//! arguments) and is off unless asked for.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "NW_INSTALL_LOG";

/// Filter expression for the given verbosity and environment.
///
/// `NW_INSTALL_LOG` wins, then `RUST_LOG`, then `debug` for `-v`, else `warn`.
pub fn filter_directive(verbose: bool, nw_log: Option<&str>, rust_log: Option<&str>) -> String {
    nw_log
        .or(rust_log)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| if verbose { "debug" } else { "warn" }.to_string())
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let nw_log = std::env::var(LOG_ENV).ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(verbose, nw_log.as_deref(), rust_log.as_deref());

    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("  [WARN] Invalid log filter '{}': {}", directive, e);
        EnvFilter::new("warn")
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init();
}
