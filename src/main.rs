use anyhow::{Context, Result};
use axum::Router;
use std::{io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use services::{
    storage_service::{DiskObjectStore, ensure_bucket_name_safe},
    upload_service::UploadService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;
    tracing::info!("Starting document-store with config: {:?}", cfg);

    ensure_bucket_name_safe(&cfg.bucket_name)
        .with_context(|| format!("BUCKET_NAME `{}` is not usable", cfg.bucket_name))?;

    // --- Ensure the metadata database directory exists ---
    let db_path = cfg
        .database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    // --- Initialize object store ---
    let store = DiskObjectStore::connect(&cfg.database_url, &cfg.storage_dir)
        .await
        .with_context(|| format!("opening object store at {}", cfg.database_url))?;
    tracing::info!("Object store ready at {}", cfg.storage_dir);

    let service = UploadService::new(Arc::new(store), cfg.upload_config());

    // --- Build router ---
    let app: Router = routes::routes::routes(&cfg).with_state(service);

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
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("Shutting down");
}
