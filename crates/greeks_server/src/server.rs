//! Server startup, binding and shutdown
//!
//! Provides functionality to start the Axum server with configurable host/port
//! and to drain it on SIGINT/SIGTERM within the configured timeout.

use std::future::{Future, IntoFuture};
use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use greeks_pipeline::GreeksPipeline;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::ServerConfig;
use crate::routes;

/// Server instance that can be started
pub struct Server {
    /// Server configuration
    config: Arc<ServerConfig>,
    /// The built router
    router: Router,
}

impl Server {
    /// Create a server over the CSV data named in the configuration
    pub fn new(config: ServerConfig) -> Self {
        let pipeline = GreeksPipeline::from_paths(
            &config.data.spot_csv,
            &config.data.options_dir,
            config.pipeline_config(),
        );
        Self::with_pipeline(config, pipeline)
    }

    /// Create a server around an existing pipeline
    pub fn with_pipeline(config: ServerConfig, pipeline: GreeksPipeline) -> Self {
        let config = Arc::new(config);
        let router = routes::build_router(Arc::clone(&config), pipeline);

        Self { config, router }
    }

    /// Get the socket address the server will bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.config.socket_addr().parse()
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server until SIGINT or SIGTERM
    pub async fn run(self) -> io::Result<()> {
        let addr = self
            .socket_addr()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let listener = TcpListener::bind(addr).await?;

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific listener until SIGINT or SIGTERM
    ///
    /// Useful for tests that bind port 0 to get a random available port.
    pub async fn run_with_listener(self, listener: TcpListener) -> io::Result<()> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` resolves
    ///
    /// In-flight requests get `shutdown_timeout_secs` to finish; after that
    /// the server returns regardless.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", addr);

        let grace = Duration::from_secs(self.config.shutdown_timeout_secs);
        let triggered = Arc::new(Notify::new());
        let trigger = Arc::clone(&triggered);

        let serve = axum::serve(listener, self.router).with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown signal received, draining connections");
            trigger.notify_one();
        });

        tokio::select! {
            result = serve.into_future() => {
                tracing::info!("Server stopped");
                result
            }
            _ = async {
                triggered.notified().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(timeout_secs = grace.as_secs(), "Shutdown timeout elapsed, dropping connections");
                Ok(())
            }
        }
    }

    /// Create a test server and return the bound address
    ///
    /// This binds to port 0 to get a random available port, starts the server
    /// in a background task, and returns the actual bound address.
    #[cfg(test)]
    pub async fn spawn_test_server(
        config: ServerConfig,
    ) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Self::new(config);
        let handle = tokio::spawn(async move {
            server
                .run_until(listener, std::future::pending())
                .await
                .ok();
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        (addr, handle)
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
