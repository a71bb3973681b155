//! Diagnostics on stderr
//!
//! Stdout belongs to Sensu: it only ever gets the check's report or its
//! metrics. Everything else is a `tracing` event that ends up on stderr.

use std::io;

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter, e.g. `docker_plugins=debug`
pub const LOG_ENV: &str = "DOCKER_PLUGINS_LOG";

/// Install the stderr logger
///
/// `verbose` forces debug output, otherwise `DOCKER_PLUGINS_LOG` decides and
/// only warnings are shown if it isn't set.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // only fails if something already installed a subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
