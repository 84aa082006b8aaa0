use anyhow::{Context, Result};
use object_gateway::{
    config::{AppConfig, BackendConfig},
    routes::routes,
    services::{
        gateway_service::GatewayService, memory_backend::InMemoryBackend,
        object_backend::ObjectBackend, s3_backend::S3Backend, staging::StagingArea,
    },
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- .env (optional) ---
    let dotenv = dotenvy::dotenv();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;
    tracing::info!("Starting object-gateway with config: {:?}", cfg);

    // --- Staging directory ---
    let staging = StagingArea::new(cfg.staging_dir.clone());
    let swept = staging
        .prepare()
        .await
        .with_context(|| format!("preparing staging dir {}", cfg.staging_dir.display()))?;
    if swept > 0 {
        tracing::warn!("Removed {} stale staging files from a previous run", swept);
    }

    // --- Storage backend ---
    let backend: Arc<dyn ObjectBackend> = match &cfg.backend {
        BackendConfig::S3(s3) => Arc::new(
            S3Backend::new(s3)
                .await
                .context("initializing S3 client")?,
        ),
        BackendConfig::InMemory => {
            tracing::warn!("Using in-memory storage; objects are lost on exit");
            Arc::new(InMemoryBackend::new("in-memory"))
        }
    };
    tracing::info!("Serving bucket {}", backend.bucket());

    // --- Build router ---
    let service = GatewayService::new(backend, staging);
    let app = routes::app(service, cfg.max_upload_bytes);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err).with_context(|| format!("binding {}", addr)),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
