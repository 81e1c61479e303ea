//! # Agora Telemetry
//!
//! Logging setup shared by the Agora binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agora_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//!     agora_telemetry::log_event!(info, "node", "Agora starting");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! - `AGORA_SERVICE_NAME`: Service name (default: agora)
//! - `AGORA_LOG_LEVEL` / `RUST_LOG`: Filter directive (default: info)
//! - `AGORA_JSON_LOGS`: JSON output (default: on inside containers)
//! - `AGORA_LOG_ANSI`: Colour output

mod config;
mod logging;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::build_filter;

#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Telemetry errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("A global subscriber is already installed")]
    AlreadyInitialised,
}

/// Guard that logs shutdown when dropped.
///
/// Keep this alive for the duration of the process.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}

/// Install the global subscriber.
///
/// Fails with [`TelemetryError::AlreadyInitialised`] when called twice.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    tracing_setup::init_subscriber(config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        log_level = %config.log_level,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = TelemetryConfig {
            log_level: "warn".into(),
            ..Default::default()
        };
        let first = init_telemetry(&config);
        let second = init_telemetry(&config);
        // Another test in this binary may have installed a subscriber first.
        assert!(first.is_ok() || matches!(first, Err(TelemetryError::AlreadyInitialised)));
        assert!(matches!(second, Err(TelemetryError::AlreadyInitialised)));
    }
}
