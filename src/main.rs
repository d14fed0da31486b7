use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use livestock_store::config::Settings;
use livestock_store::services::{NewsApiClient, Services};
use livestock_store::storage::{MemoryObjectStore, MemoryStore, MinioStore, ObjectStore};
use livestock_store::utils::init_tracing;
use livestock_store::router;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let settings = Settings::new().context("loading settings")?;

    let store = Arc::new(match &settings.store.snapshot_path {
        Some(path) => MemoryStore::open(path).await?,
        None => {
            warn!("No snapshot path configured, data lives in memory only");
            MemoryStore::new()
        }
    });

    let objects: Arc<dyn ObjectStore> = match MinioStore::new(&settings.minio).await {
        Ok(minio) => Arc::new(minio),
        Err(e) => {
            warn!(error = %e, "MinIO unavailable, keeping uploads in memory");
            Arc::new(MemoryObjectStore::new(settings.minio.public_base_url.clone()))
        }
    };

    let news = Arc::new(NewsApiClient::new(&settings.news)?);
    let services = Services::new(
        store,
        objects,
        news,
        settings.news.cache_ttl_secs,
        &settings.business,
    );

    if settings.business.owner_uid.trim().is_empty() {
        warn!("business.owner_uid is empty, owner-only actions are disabled");
    }

    let rollover = services
        .revenue
        .spawn_rollover_job(Duration::from_secs(settings.business.rollover_interval_secs.max(1)));

    let listener = tokio::net::TcpListener::bind(&settings.server.bind)
        .await
        .with_context(|| format!("binding {}", settings.server.bind))?;
    info!(addr = %settings.server.bind, "Livestock store listening");

    axum::serve(listener, router(services))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    rollover.abort();
    Ok(())
}
