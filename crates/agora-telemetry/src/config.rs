//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info` or `agora_gateway=debug,info`
    pub log_level: String,

    /// JSON lines instead of human-readable output
    pub json_logs: bool,

    /// ANSI colours in human-readable output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "agora".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AGORA_SERVICE_NAME`: Service name (default: agora)
    /// - `AGORA_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `AGORA_JSON_LOGS`: JSON output (default: false in dev, true in containers)
    /// - `AGORA_LOG_ANSI`: Colour output (default: true unless JSON)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        let json_logs = lookup("AGORA_JSON_LOGS")
            .map(|v| is_truthy(&v))
            .unwrap_or(is_container);

        Self {
            service_name: lookup("AGORA_SERVICE_NAME").unwrap_or_else(|| "agora".to_string()),

            log_level: lookup("AGORA_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            json_logs,

            ansi: lookup("AGORA_LOG_ANSI")
                .map(|v| is_truthy(&v))
                .unwrap_or(!json_logs),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
