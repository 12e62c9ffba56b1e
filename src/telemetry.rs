//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

/// Installs the global subscriber. `RUST_LOG` overrides the configured
/// level; production logs are JSON lines.
pub fn init_tracing(server: &ServerConfig) -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if server.is_production() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| format!("Failed to initialize logging: {}", e))
}
