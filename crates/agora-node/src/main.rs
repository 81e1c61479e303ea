//! # Agora Node
//!
//! Entry point for the Agora collaboration server.
//!
//! ## Startup Sequence
//!
//! 1. Load `.env` if present
//! 2. Initialise telemetry
//! 3. Load configuration from the environment
//! 4. Open the document store (file-backed or in-memory)
//! 5. Build services, event bus and the optional Google verifier
//! 6. Start the gateway
//! 7. Serve until Ctrl-C or SIGTERM, then shut down gracefully

mod config;

use std::sync::Arc;

use agora_gateway::{AgoraGateway, GoogleIdentityVerifier, TokenInfoVerifier};
use agora_storage::Services;
use agora_telemetry::{init_telemetry, log_event, TelemetryConfig};
use anyhow::{Context, Result};

use crate::config::NodeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal outside development.
    let dotenv = dotenvy::dotenv();

    let telemetry = TelemetryConfig::from_env();
    let _guard = init_telemetry(&telemetry).context("Failed to initialise telemetry")?;

    if let Ok(path) = dotenv {
        log_event!(info, "node", "Loaded environment file", path = %path.display());
    }

    let config = NodeConfig::from_env().context("Invalid configuration")?;

    log_event!(
        info,
        "node",
        "Starting Agora node",
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.gateway.http_addr()
    );

    let store = config
        .open_store()
        .context("Failed to open document store")?;
    let services = Services::new(Arc::new(store));

    let google = google_verifier(&config)?;
    if google.is_none() {
        log_event!(warn, "node", "GOOGLE_CLIENT_ID not set, Google sign-in disabled");
    }

    let mut gateway = AgoraGateway::new(config.gateway, services, google)
        .context("Failed to build gateway")?;
    let addr = gateway.start().await.context("Failed to start gateway")?;

    log_event!(info, "node", "Agora node is running", addr = %addr);

    shutdown_signal().await;

    log_event!(info, "node", "Shutdown signal received");
    gateway.shutdown();
    gateway.wait().await.context("Gateway stopped with an error")?;

    log_event!(info, "node", "Agora node stopped");
    Ok(())
}

fn google_verifier(config: &NodeConfig) -> Result<Option<Arc<dyn GoogleIdentityVerifier>>> {
    let google = &config.gateway.google;
    let Some(client_id) = google.client_id.as_deref() else {
        return Ok(None);
    };

    let verifier = TokenInfoVerifier::new(
        client_id,
        google.tokeninfo_url.as_str(),
        config.gateway.timeouts.request,
    )
    .context("Failed to build Google verifier")?;

    Ok(Some(Arc::new(verifier)))
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_event!(error, "node", "Failed to listen for Ctrl-C", error = %e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_event!(error, "node", "Failed to listen for SIGTERM", error = %e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
