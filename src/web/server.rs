//! Web server using Axum.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::router::create_app_router;
use crate::config;
use crate::core::Assistant;
use crate::error::{Error, Result};

/// Web server configuration.
pub struct WebServerConfig {
    pub port: u16,
    pub host: String,
    pub max_concurrent_commands: usize,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        let web = config::Web::default();
        Self {
            port: web.port,
            host: web.host,
            max_concurrent_commands: web.max_concurrent_commands,
        }
    }
}

impl From<&config::Web> for WebServerConfig {
    fn from(web: &config::Web) -> Self {
        Self {
            port: web.port,
            host: web.host.clone(),
            max_concurrent_commands: web.max_concurrent_commands,
        }
    }
}

/// Run the web server until `shutdown` resolves.
pub async fn run_server<F>(assistant: Arc<Assistant>, config: WebServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app_router(assistant, config.max_concurrent_commands)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| Error::Web(format!("Invalid address: {}", e)))?;

    tracing::info!("Starting web server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Web server stopped");
    Ok(())
}
