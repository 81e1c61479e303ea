//! Gateway service - binds the listener and runs the axum server.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::ports::GoogleIdentityVerifier;
use crate::router::{build_router, AppState};
use agora_bus::{InMemoryEventBus, RoomRegistry, DEFAULT_CHANNEL_CAPACITY};
use agora_storage::Services;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Agora gateway service
pub struct AgoraGateway {
    config: GatewayConfig,
    state: AppState,
    router: Router,
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: Option<SocketAddr>,
    server: Option<JoinHandle<Result<(), std::io::Error>>>,
}

impl AgoraGateway {
    /// Create a new gateway over the given services
    pub fn new(
        config: GatewayConfig,
        services: Services,
        google: Option<Arc<dyn GoogleIdentityVerifier>>,
    ) -> Result<Self, GatewayError> {
        // Validate configuration
        config.validate()?;

        let rooms = Arc::new(RoomRegistry::new(
            config.websocket.max_rooms_per_connection,
        ));
        let bus = Arc::new(InMemoryEventBus::with_registry(
            DEFAULT_CHANNEL_CAPACITY,
            rooms,
        ));

        let state = AppState::new(services, bus, google, config.websocket.clone());
        let router = build_router(state.clone(), &config);

        Ok(Self {
            config,
            state,
            router,
            shutdown_tx: None,
            local_addr: None,
            server: None,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.state.bus)
    }

    /// The assembled router, for serving on a custom listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Address the server is listening on, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind the HTTP listener and serve in the background.
    pub async fn start(&mut self) -> Result<SocketAddr, GatewayError> {
        let addr = self.config.http_addr();
        info!(addr = %addr, "Starting Agora gateway...");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);
        self.local_addr = Some(local_addr);

        let router = self.router.clone();
        self.server = Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        }));

        info!(addr = %local_addr, "Agora gateway listening");
        Ok(local_addr)
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            info!("Shutting down Agora gateway");
            let _ = tx.send(());
        }
    }

    /// Wait for the server task to finish.
    pub async fn wait(&mut self) -> Result<(), GatewayError> {
        let Some(server) = self.server.take() else {
            return Ok(());
        };

        match server.await {
            Ok(Ok(())) => {
                info!("Agora gateway stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "HTTP server error");
                Err(GatewayError::Serve(e))
            }
            Err(e) => Err(GatewayError::Internal(format!("server task failed: {}", e))),
        }
    }
}
