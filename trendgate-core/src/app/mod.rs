//! Trendgate server
//!
//! Wires configuration, the provider, the fetch orchestrator and the HTTP
//! routes together, then runs the accept loop.
//!
//! # Example
//!
//! ```no_run
//! use trendgate_core::app::TrendGateServer;
//! use trendgate_core::config::TrendGateConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! TrendGateServer::with_config(TrendGateConfig::load()?)
//!     .with_port(8080)
//!     .serve()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;

pub use builder::TrendGateServerBuilder;

use crate::config::TrendGateConfig;
use crate::http::{handle_request, AppState};
use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// A fully wired server, not yet listening
pub struct TrendGateServer {
    config: TrendGateConfig,
    state: Arc<AppState>,
}

impl TrendGateServer {
    /// Start building a server from default configuration
    pub fn new() -> TrendGateServerBuilder {
        TrendGateServerBuilder::new()
    }

    /// Start building a server from `config`
    pub fn with_config(config: TrendGateConfig) -> TrendGateServerBuilder {
        TrendGateServerBuilder::with_config(config)
    }

    pub fn config(&self) -> &TrendGateConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve connections from `listener` until `shutdown` completes
    ///
    /// In-flight connections are left to finish on their own tasks.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local: SocketAddr = listener.local_addr().context("Listener has no local address")?;
        self.log_startup(local);

        tokio::pin!(shutdown);
        loop {
            let (stream, remote) = tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        log::warn!("Failed to accept connection: {}", err);
                        continue;
                    }
                },
            };

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    handle_request(req, Arc::clone(&state))
                });
                if let Err(err) =
                    http1::Builder::new().serve_connection(TokioIo::new(stream), service).await
                {
                    log::debug!("Connection from {} ended with error: {}", remote, err);
                }
            });
        }
    }

    fn log_startup(&self, local: SocketAddr) {
        let config = &self.config;
        log::info!("Trendgate listening on http://{}", local);
        log::info!(
            "   Cache: ttl {}s, max {} items{}",
            config.cache.ttl_seconds,
            config.cache.max_items,
            if config.cache.enabled() { "" } else { " (disabled)" }
        );
        log::info!(
            "   Cooldown: {}s per key, coalescing {}",
            config.throttle.cooldown_seconds,
            if config.throttle.coalesce_requests { "on" } else { "off" }
        );
        log::info!(
            "   Retry: {} attempts, backoff base {} ms",
            config.retry.max_retries.max(1),
            config.retry.backoff_base_ms
        );
        log::info!(
            "   Provider: {} (geo {}, timeframe '{}')",
            config.provider.base_url,
            config.provider.default_geo,
            config.provider.timeframe
        );
    }
}

/// Resolves on Ctrl-C; never resolves if the signal can't be installed
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("Could not listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
}
