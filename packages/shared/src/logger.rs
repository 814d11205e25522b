//! Logger setup built on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Build the default filter directive for a binary.
///
/// Cargo binary names use hyphens while tracing targets use underscores,
/// so `kaiwa-server` becomes `kaiwa_server=debug`.
pub fn default_directive(bin_name: &str, default_level: &str) -> String {
    let target = bin_name.replace('-', "_");
    format!("{target}={default_level},kaiwa_shared={default_level},tower_http={default_level}")
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when it is set.
/// Calling this more than once is harmless; later calls are ignored.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(bin_name, default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
