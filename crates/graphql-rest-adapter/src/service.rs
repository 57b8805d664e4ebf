//! HTTP server hosting an adapted router.

use crate::domain::config::ServerConfig;
use crate::domain::error::ServerError;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::info;

/// Triggers graceful shutdown of a running [`AdapterServer`]
#[derive(Clone)]
pub struct ShutdownHandle(Arc<Notify>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        // notify_one keeps a permit if serve() is not waiting yet
        self.0.notify_one();
    }
}

pub struct AdapterServer {
    config: ServerConfig,
    router: Router,
    listener: Option<TcpListener>,
    shutdown: Arc<Notify>,
}

impl AdapterServer {
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router,
            listener: None,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Bind the listener. Returns the bound address (useful with port 0).
    pub async fn bind(&mut self) -> Result<SocketAddr, ServerError> {
        if let Some(addr) = self.local_addr() {
            return Ok(addr);
        }

        let listener = TcpListener::bind(self.config.addr())
            .await
            .map_err(ServerError::Bind)?;
        let addr = listener.local_addr().map_err(ServerError::Bind)?;
        info!(addr = %addr, "REST adapter listening");

        self.listener = Some(listener);
        Ok(addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref()?.local_addr().ok()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        self.shutdown_handle().shutdown();
    }

    /// Serve until shutdown is triggered. Binds first if needed.
    pub async fn serve(mut self) -> Result<(), ServerError> {
        self.bind().await?;
        let listener = self.listener.take().ok_or(ServerError::NotBound)?;
        let shutdown = Arc::clone(&self.shutdown);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.notified().await;
                info!("Received shutdown signal");
            })
            .await
            .map_err(ServerError::Serve)?;

        info!("REST adapter stopped");
        Ok(())
    }
}
