//! # Logging
//!
//! `tracing-subscriber` setup shared by the service and `vssctl`.
//!
//! `RUST_LOG` takes precedence; otherwise the configured level applies to this crate
//! and `warn` to everything else.

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is not set
fn default_directives(log_level: &str) -> String {
    let level = match log_level.to_ascii_lowercase().as_str() {
        level @ ("error" | "warn" | "info" | "debug" | "trace") => level.to_string(),
        _ => "info".to_string(),
    };
    format!("warn,vault_secret_sync={level},vssctl={level}")
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}
