//! Diagnostic logging.
//!
//! The library emits `tracing` events; only the binary installs a
//! subscriber. Events go to stderr so they never mix with command output,
//! and they carry counts, paths and record ids only, never secrets or
//! record contents.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter (e.g. `passvault=debug`).
pub const LOG_ENV: &str = "PASSVAULT_LOG";

/// Install the stderr subscriber. Defaults to warnings only.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .with(filter)
        .try_init();
}
