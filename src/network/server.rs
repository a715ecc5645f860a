//! HTTP Server
//!
//! Binds the listen address and serves the data directory through axum.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::fs::DiskFs;

use super::{build_router, StaticFiles};

/// Static-file HTTP server over the data directory
pub struct Server {
    config: Config,
    listener: TcpListener,
}

impl Server {
    /// Bind the listen address from `config`
    pub async fn bind(config: Config) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).await.map_err(|e| {
            StoreError::Network(format!("cannot bind {}: {}", config.listen_addr, e))
        })?;

        Ok(Self { config, listener })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Build the router (useful for testing)
    pub fn router(&self) -> Router {
        let files = StaticFiles::new(
            DiskFs::new(&self.config.data_dir),
            self.config.index_file.clone(),
        );
        build_router(files, &self.config)
    }

    /// Serve until the process is stopped
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes, then let open requests finish
    pub async fn run_until<S>(self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        tracing::info!(
            "Serving {:?} on {} (max {} requests in flight)",
            self.config.data_dir,
            self.local_addr()?,
            self.config.max_connections
        );

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        tracing::info!("Server stopped");
        Ok(())
    }
}
